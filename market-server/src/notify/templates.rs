//! Message templates
//!
//! Subject and body per notification kind per locale. Unsupported locale
//! codes fall back to English rather than failing the dispatch.

use super::Notification;
use super::transport::MailMessage;

/// Supported message locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Hi,
    Kn,
}

impl Locale {
    /// Resolve a stored language code; anything unrecognized (or absent)
    /// is English.
    pub fn parse(code: Option<&str>) -> Locale {
        match code.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("hi") => Locale::Hi,
            Some("kn") => Locale::Kn,
            _ => Locale::En,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Hi => "hi",
            Locale::Kn => "kn",
        }
    }
}

/// Render an addressed message for `notification` in `locale`.
pub fn render(to: &str, notification: &Notification, locale: Locale) -> MailMessage {
    let (subject, body) = match notification {
        Notification::Welcome { name } => welcome(name, locale),
        Notification::CropUploaded {
            name,
            crop_name,
            quantity_kg,
        } => crop_uploaded(name, crop_name, &quantity_kg.to_string(), locale),
        Notification::CropExpired {
            name,
            crop_name,
            expiry_date,
        } => {
            let date = expiry_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            crop_expired(name, crop_name, &date, locale)
        }
        Notification::DealUploaded { name, crop_name } => deal_uploaded(name, crop_name, locale),
        Notification::PurchaseConfirmation {
            name,
            invoice_id,
            total,
        } => purchase_confirmation(name, invoice_id, &total.to_string(), locale),
        Notification::PurchaseNotification {
            name,
            crop_name,
            quantity_kg,
            buyer_name,
            buyer_phone,
            net_amount,
        } => purchase_notification(
            name,
            crop_name,
            &quantity_kg.to_string(),
            buyer_name,
            buyer_phone.as_deref().unwrap_or("-"),
            &net_amount.to_string(),
            locale,
        ),
    };
    MailMessage {
        to: to.to_string(),
        subject,
        body,
    }
}

const SIGNATURE_EN: &str = "AgriMarket Team";
const SIGNATURE_HI: &str = "एग्रीमार्केट टीम";
const SIGNATURE_KN: &str = "ಅಗ್ರಿಮಾರ್ಕೆಟ್ ತಂಡ";

fn welcome(name: &str, locale: Locale) -> (String, String) {
    match locale {
        Locale::En => (
            "Welcome to AgriMarket".into(),
            format!(
                "Dear {name},\n\nYour AgriMarket account has been created. \
                 You can now list crops and trade directly on the marketplace.\n\n{SIGNATURE_EN}"
            ),
        ),
        Locale::Hi => (
            "एग्रीमार्केट में आपका स्वागत है".into(),
            format!(
                "प्रिय {name},\n\nआपका एग्रीमार्केट खाता बना दिया गया है। \
                 अब आप फसलें सूचीबद्ध कर सकते हैं और सीधे व्यापार कर सकते हैं।\n\n{SIGNATURE_HI}"
            ),
        ),
        Locale::Kn => (
            "ಅಗ್ರಿಮಾರ್ಕೆಟ್‌ಗೆ ಸುಸ್ವಾಗತ".into(),
            format!(
                "ಆತ್ಮೀಯ {name},\n\nನಿಮ್ಮ ಅಗ್ರಿಮಾರ್ಕೆಟ್ ಖಾತೆ ರಚಿಸಲಾಗಿದೆ. \
                 ಈಗ ನೀವು ಬೆಳೆಗಳನ್ನು ಪಟ್ಟಿ ಮಾಡಿ ನೇರವಾಗಿ ವ್ಯಾಪಾರ ಮಾಡಬಹುದು.\n\n{SIGNATURE_KN}"
            ),
        ),
    }
}

fn crop_uploaded(name: &str, crop: &str, qty: &str, locale: Locale) -> (String, String) {
    match locale {
        Locale::En => (
            format!("Your crop '{crop}' is live"),
            format!(
                "Dear {name},\n\nYour listing for {crop} ({qty} kg) is now visible to buyers.\n\n{SIGNATURE_EN}"
            ),
        ),
        Locale::Hi => (
            format!("आपकी फसल '{crop}' सूचीबद्ध हो गई"),
            format!(
                "प्रिय {name},\n\nआपकी फसल {crop} ({qty} किग्रा) अब खरीदारों को दिखाई दे रही है।\n\n{SIGNATURE_HI}"
            ),
        ),
        Locale::Kn => (
            format!("ನಿಮ್ಮ ಬೆಳೆ '{crop}' ಪಟ್ಟಿಯಾಗಿದೆ"),
            format!(
                "ಆತ್ಮೀಯ {name},\n\nನಿಮ್ಮ ಬೆಳೆ {crop} ({qty} ಕೆಜಿ) ಈಗ ಖರೀದಿದಾರರಿಗೆ ಕಾಣಿಸುತ್ತಿದೆ.\n\n{SIGNATURE_KN}"
            ),
        ),
    }
}

fn crop_expired(name: &str, crop: &str, date: &str, locale: Locale) -> (String, String) {
    match locale {
        Locale::En => (
            format!("Your crop '{crop}' has expired"),
            format!(
                "Dear {name},\n\nYour listing for {crop} passed its expiry date ({date}). \
                 Please review or remove the listing.\n\n{SIGNATURE_EN}"
            ),
        ),
        Locale::Hi => (
            format!("आपकी फसल '{crop}' की अवधि समाप्त हो गई"),
            format!(
                "प्रिय {name},\n\nआपकी फसल {crop} की समाप्ति तिथि ({date}) बीत चुकी है। \
                 कृपया सूची की समीक्षा करें या उसे हटा दें।\n\n{SIGNATURE_HI}"
            ),
        ),
        Locale::Kn => (
            format!("ನಿಮ್ಮ ಬೆಳೆ '{crop}' ಅವಧಿ ಮುಗಿದಿದೆ"),
            format!(
                "ಆತ್ಮೀಯ {name},\n\nನಿಮ್ಮ ಬೆಳೆ {crop} ಮುಕ್ತಾಯ ದಿನಾಂಕ ({date}) ದಾಟಿದೆ. \
                 ದಯವಿಟ್ಟು ಪಟ್ಟಿಯನ್ನು ಪರಿಶೀಲಿಸಿ ಅಥವಾ ತೆಗೆದುಹಾಕಿ.\n\n{SIGNATURE_KN}"
            ),
        ),
    }
}

fn deal_uploaded(name: &str, crop: &str, locale: Locale) -> (String, String) {
    match locale {
        Locale::En => (
            format!("Your deal for '{crop}' is live"),
            format!(
                "Dear {name},\n\nYour request for {crop} is now visible to farmers.\n\n{SIGNATURE_EN}"
            ),
        ),
        Locale::Hi => (
            format!("'{crop}' के लिए आपका सौदा सूचीबद्ध हो गया"),
            format!(
                "प्रिय {name},\n\n{crop} के लिए आपका अनुरोध अब किसानों को दिखाई दे रहा है।\n\n{SIGNATURE_HI}"
            ),
        ),
        Locale::Kn => (
            format!("'{crop}' ಗಾಗಿ ನಿಮ್ಮ ಬೇಡಿಕೆ ಪಟ್ಟಿಯಾಗಿದೆ"),
            format!(
                "ಆತ್ಮೀಯ {name},\n\n{crop} ಗಾಗಿ ನಿಮ್ಮ ಬೇಡಿಕೆ ಈಗ ರೈತರಿಗೆ ಕಾಣಿಸುತ್ತಿದೆ.\n\n{SIGNATURE_KN}"
            ),
        ),
    }
}

fn purchase_confirmation(name: &str, invoice: &str, total: &str, locale: Locale) -> (String, String) {
    match locale {
        Locale::En => (
            format!("Order confirmed — invoice {invoice}"),
            format!(
                "Dear {name},\n\nYour order (invoice {invoice}) has been recorded. \
                 Total: Rs {total}.\n\n{SIGNATURE_EN}"
            ),
        ),
        Locale::Hi => (
            format!("ऑर्डर की पुष्टि — चालान {invoice}"),
            format!(
                "प्रिय {name},\n\nआपका ऑर्डर (चालान {invoice}) दर्ज कर लिया गया है। \
                 कुल: Rs {total}।\n\n{SIGNATURE_HI}"
            ),
        ),
        Locale::Kn => (
            format!("ಆರ್ಡರ್ ದೃಢೀಕರಿಸಲಾಗಿದೆ — ಸರಕುಪಟ್ಟಿ {invoice}"),
            format!(
                "ಆತ್ಮೀಯ {name},\n\nನಿಮ್ಮ ಆರ್ಡರ್ (ಸರಕುಪಟ್ಟಿ {invoice}) ದಾಖಲಾಗಿದೆ. \
                 ಒಟ್ಟು: Rs {total}.\n\n{SIGNATURE_KN}"
            ),
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn purchase_notification(
    name: &str,
    crop: &str,
    qty: &str,
    buyer: &str,
    buyer_phone: &str,
    net: &str,
    locale: Locale,
) -> (String, String) {
    match locale {
        Locale::En => (
            format!("Your crop '{crop}' was purchased"),
            format!(
                "Dear {name},\n\n{buyer} (phone: {buyer_phone}) bought {qty} kg of {crop}. \
                 Net amount payable to you after deductions: Rs {net}.\n\n{SIGNATURE_EN}"
            ),
        ),
        Locale::Hi => (
            format!("आपकी फसल '{crop}' खरीदी गई"),
            format!(
                "प्रिय {name},\n\n{buyer} (फोन: {buyer_phone}) ने {crop} की {qty} किग्रा खरीदी। \
                 कटौती के बाद आपको देय शुद्ध राशि: Rs {net}।\n\n{SIGNATURE_HI}"
            ),
        ),
        Locale::Kn => (
            format!("ನಿಮ್ಮ ಬೆಳೆ '{crop}' ಖರೀದಿಸಲಾಗಿದೆ"),
            format!(
                "ಆತ್ಮೀಯ {name},\n\n{buyer} (ಫೋನ್: {buyer_phone}) {crop} ನ {qty} ಕೆಜಿ ಖರೀದಿಸಿದ್ದಾರೆ. \
                 ಕಡಿತದ ನಂತರ ನಿಮಗೆ ಪಾವತಿಸಬೇಕಾದ ನಿವ್ವಳ ಮೊತ್ತ: Rs {net}.\n\n{SIGNATURE_KN}"
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn locale_parse_falls_back_to_english() {
        assert_eq!(Locale::parse(Some("hi")), Locale::Hi);
        assert_eq!(Locale::parse(Some("KN")), Locale::Kn);
        assert_eq!(Locale::parse(Some("fr")), Locale::En);
        assert_eq!(Locale::parse(None), Locale::En);
    }

    #[test]
    fn render_substitutes_fields() {
        let message = render(
            "ravi@example.com",
            &Notification::CropExpired {
                name: "Ravi".into(),
                crop_name: "Tomato".into(),
                expiry_date: Some(chrono::NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()),
            },
            Locale::En,
        );
        assert_eq!(message.to, "ravi@example.com");
        assert!(message.subject.contains("Tomato"));
        assert!(message.body.contains("2026-01-15"));
    }

    #[test]
    fn render_localizes_subject() {
        let notification = Notification::Welcome { name: "Ravi".into() };
        let hi = render("a@b.c", &notification, Locale::Hi);
        let kn = render("a@b.c", &notification, Locale::Kn);
        assert_ne!(hi.subject, kn.subject);
        assert!(hi.subject.contains("स्वागत"));
    }

    #[test]
    fn purchase_notification_carries_net_amount() {
        let message = render(
            "farmer@example.com",
            &Notification::PurchaseNotification {
                name: "Ravi".into(),
                crop_name: "Wheat".into(),
                quantity_kg: dec!(100),
                buyer_name: "Anita".into(),
                buyer_phone: Some("9876543210".into()),
                net_amount: dec!(920.00),
            },
            Locale::En,
        );
        assert!(message.body.contains("920.00"));
        assert!(message.body.contains("Anita"));
    }
}
