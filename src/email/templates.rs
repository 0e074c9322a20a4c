//! HTML and plain-text bodies for transactional mail.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt::Write as _;

use crate::models::{company, purchase_order, purchase_order_delivery, purchase_order_line};
use crate::rich_text::{self, escape};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Person<'a> {
    pub email: &'a str,
    pub name: Option<&'a str>,
}

impl Person<'_> {
    fn display(&self) -> &str {
        self.name.filter(|n| !n.trim().is_empty()).unwrap_or(self.email)
    }
}

fn language(locale: &str) -> &str {
    locale.split('-').next().unwrap_or(locale)
}

fn uses_decimal_comma(locale: &str) -> bool {
    matches!(
        language(locale),
        "de" | "fr" | "es" | "it" | "pt" | "nl" | "da" | "sv" | "nb" | "pl" | "tr"
    )
}

pub fn format_date(date: NaiveDate, locale: &str) -> String {
    match locale {
        "en-US" | "en" => date.format("%m/%d/%Y").to_string(),
        _ if language(locale) == "de" => date.format("%d.%m.%Y").to_string(),
        _ if language(locale) == "ja" || language(locale) == "zh" => {
            date.format("%Y/%m/%d").to_string()
        }
        _ if language(locale) == "en" || uses_decimal_comma(locale) => {
            date.format("%d/%m/%Y").to_string()
        }
        _ => date.format("%Y-%m-%d").to_string(),
    }
}

pub fn format_money(amount: Decimal, currency: &str, locale: &str) -> String {
    let rounded = format!("{:.2}", amount.round_dp(2));
    let number = if uses_decimal_comma(locale) {
        rounded.replace('.', ",")
    } else {
        rounded
    };
    format!("{} {}", number, currency)
}

/// Purchase order sent to the supplier contact on release
pub struct PurchaseOrderEmail<'a> {
    pub company: &'a company::Model,
    pub locale: &'a str,
    pub purchase_order: &'a purchase_order::Model,
    pub lines: &'a [purchase_order_line::Model],
    pub delivery: Option<&'a purchase_order_delivery::Model>,
    pub recipient: Person<'a>,
    pub sender: Person<'a>,
}

impl PurchaseOrderEmail<'_> {
    pub fn subject(&self) -> String {
        format!(
            "{} from {}",
            self.purchase_order.purchase_order_id, self.company.name
        )
    }

    fn total(&self) -> Decimal {
        self.lines.iter().map(|l| l.extended_price()).sum()
    }

    pub fn render(&self) -> RenderedEmail {
        let po = self.purchase_order;
        let currency = po.currency_code.as_str();
        let order_date = format_date(po.order_date, self.locale);
        let requested = self
            .delivery
            .and_then(|d| d.receipt_requested_date)
            .map(|d| format_date(d, self.locale));
        let notes = po.external_notes.as_ref().filter(|n| !rich_text::is_empty(n));

        let mut html = String::new();
        let _ = write!(
            html,
            "<html lang=\"{}\"><body><h1>{}</h1><p>Hi {},</p><p>{} has released purchase order <strong>{}</strong> dated {}.</p>",
            escape(self.locale),
            escape(&self.company.name),
            escape(self.recipient.display()),
            escape(&self.company.name),
            escape(&po.purchase_order_id),
            escape(&order_date),
        );
        if let Some(date) = &requested {
            let _ = write!(html, "<p>Requested receipt date: {}</p>", escape(date));
        }

        html.push_str("<table><thead><tr><th>Description</th><th>Quantity</th><th>Unit Price</th><th>Total</th></tr></thead><tbody>");
        for line in self.lines {
            let _ = write!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&line.description),
                line.quantity.normalize(),
                escape(&format_money(line.unit_price, currency, self.locale)),
                escape(&format_money(line.extended_price(), currency, self.locale)),
            );
        }
        let _ = write!(
            html,
            "</tbody><tfoot><tr><td colspan=\"3\">Total</td><td>{}</td></tr></tfoot></table>",
            escape(&format_money(self.total(), currency, self.locale))
        );
        if let Some(notes) = notes {
            html.push_str("<h2>Notes</h2>");
            html.push_str(&rich_text::to_html(notes));
        }
        let _ = write!(
            html,
            "<p>The purchase order is attached as a PDF. Reply to {} with any questions.</p><p>{}</p></body></html>",
            escape(self.sender.email),
            escape(self.sender.display()),
        );

        let mut text = String::new();
        let _ = writeln!(text, "Hi {},", self.recipient.display());
        let _ = writeln!(text);
        let _ = writeln!(
            text,
            "{} has released purchase order {} dated {}.",
            self.company.name, po.purchase_order_id, order_date
        );
        if let Some(date) = &requested {
            let _ = writeln!(text, "Requested receipt date: {}", date);
        }
        let _ = writeln!(text);
        for line in self.lines {
            let _ = writeln!(
                text,
                "- {} x{} @ {} = {}",
                line.description,
                line.quantity.normalize(),
                format_money(line.unit_price, currency, self.locale),
                format_money(line.extended_price(), currency, self.locale),
            );
        }
        let _ = writeln!(text, "Total: {}", format_money(self.total(), currency, self.locale));
        if let Some(notes) = notes {
            let _ = writeln!(text);
            let _ = writeln!(text, "Notes:");
            let _ = writeln!(text, "{}", rich_text::to_plain_text(notes));
        }
        let _ = writeln!(text);
        let _ = writeln!(
            text,
            "The purchase order is attached as a PDF. Reply to {} with any questions.",
            self.sender.email
        );
        let _ = write!(text, "{}", self.sender.display());

        RenderedEmail { html, text }
    }
}

/// Invitation to join a company workspace
pub struct InviteEmail<'a> {
    pub invited_by: Person<'a>,
    pub email: &'a str,
    pub company_name: &'a str,
    pub invite_link: &'a str,
    pub ip: &'a str,
    pub location: &'a str,
}

impl InviteEmail<'_> {
    pub fn subject(&self) -> String {
        format!("You have been invited to join {}", self.company_name)
    }

    pub fn render(&self) -> RenderedEmail {
        let link_ok = rich_text::is_safe_url(self.invite_link);
        let mut html = String::new();
        let _ = write!(
            html,
            "<html><body><h1>Join {}</h1><p>{} ({}) has invited you to the {} team.</p>",
            escape(self.company_name),
            escape(self.invited_by.display()),
            escape(self.invited_by.email),
            escape(self.company_name),
        );
        if link_ok {
            let _ = write!(
                html,
                "<p><a href=\"{}\">Accept invite</a></p>",
                escape(self.invite_link)
            );
        }
        let _ = write!(
            html,
            "<p>This invitation was intended for {}. It was sent from {} located in {}. If you were not expecting this invitation, you can ignore this email.</p></body></html>",
            escape(self.email),
            escape(self.ip),
            escape(self.location),
        );

        let text = format!(
            "{} ({}) has invited you to the {} team.\n\nAccept the invite: {}\n\nThis invitation was intended for {}. It was sent from {} located in {}.",
            self.invited_by.display(),
            self.invited_by.email,
            self.company_name,
            self.invite_link,
            self.email,
            self.ip,
            self.location,
        );

        RenderedEmail { html, text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PurchaseOrderStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;
    use uuid::Uuid;

    fn company() -> company::Model {
        company::Model {
            id: Uuid::new_v4(),
            name: "Acme <Tools>".into(),
            email: None,
            phone: None,
            address_line1: None,
            city: None,
            postal_code: None,
            country_code: None,
            created_at: Utc::now(),
        }
    }

    fn order(company_id: Uuid) -> purchase_order::Model {
        purchase_order::Model {
            id: Uuid::new_v4(),
            purchase_order_id: "PO000007".into(),
            company_id,
            supplier_id: Uuid::new_v4(),
            supplier_interaction_id: Uuid::new_v4(),
            supplier_contact_id: None,
            supplier_reference: None,
            status: PurchaseOrderStatus::Released,
            order_date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            currency_code: "EUR".into(),
            exchange_rate: Decimal::ONE,
            internal_notes: Some(json!({"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"secret margin"}]}]})),
            external_notes: Some(json!({"type":"doc","content":[{"type":"paragraph","content":[{"type":"text","text":"Deliver to dock 4"}]}]})),
            custom_fields: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
            released_by: None,
            released_at: None,
        }
    }

    fn line(po: &purchase_order::Model, qty: &str, price: &str) -> purchase_order_line::Model {
        purchase_order_line::Model {
            id: Uuid::new_v4(),
            purchase_order_id: po.id,
            company_id: po.company_id,
            description: "Bolt M6".into(),
            quantity: Decimal::from_str(qty).unwrap(),
            unit_price: Decimal::from_str(price).unwrap(),
            internal_notes: None,
            external_notes: None,
            updated_by: None,
            updated_at: None,
        }
    }

    #[test]
    fn purchase_order_email_is_localized_and_escaped() {
        let company = company();
        let po = order(company.id);
        let lines = vec![line(&po, "10", "1.25"), line(&po, "2", "3.5")];
        let email = PurchaseOrderEmail {
            company: &company,
            locale: "de-DE",
            purchase_order: &po,
            lines: &lines,
            delivery: None,
            recipient: Person { email: "sales@supplier.test", name: Some("Sam") },
            sender: Person { email: "buyer@acme.test", name: None },
        };

        assert_eq!(email.subject(), "PO000007 from Acme <Tools>");
        let rendered = email.render();
        assert!(rendered.html.contains("Acme &lt;Tools&gt;"));
        assert!(rendered.html.contains("09.03.2024"));
        assert!(rendered.html.contains("19,50 EUR"));
        assert!(rendered.html.contains("Deliver to dock 4"));
        assert!(!rendered.html.contains("secret margin"));
        assert!(rendered.text.starts_with("Hi Sam,"));
        assert!(rendered.text.contains("Total: 19,50 EUR"));
    }

    #[test]
    fn us_dates_and_decimal_point() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_date(date, "en-US"), "03/09/2024");
        assert_eq!(format_date(date, "en-GB"), "09/03/2024");
        assert_eq!(format_date(date, "xx"), "2024-03-09");
        assert_eq!(format_money(Decimal::new(12346, 3), "USD", "en-US"), "12.35 USD");
    }

    #[test]
    fn invite_email_carries_link_and_origin() {
        let email = InviteEmail {
            invited_by: Person { email: "owner@acme.test", name: Some("Olive Owner") },
            email: "new@acme.test",
            company_name: "Acme",
            invite_link: "https://app.carbon.test/invite/abc123",
            ip: "203.0.113.9",
            location: "Berlin, DE",
        };
        assert_eq!(email.subject(), "You have been invited to join Acme");
        let rendered = email.render();
        assert!(rendered.html.contains("href=\"https://app.carbon.test/invite/abc123\""));
        assert!(rendered.text.contains("203.0.113.9"));
        assert!(rendered.text.contains("Berlin, DE"));
    }
}
