//! Email templates for rental notifications

use chrono::NaiveDate;

use crate::models::email::{EmailTemplate, Notification};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render a notification into subject, plain text and html
pub fn render(brand: &str, notification: &Notification) -> EmailTemplate {
    match notification {
        Notification::RentalRequest {
            user_name,
            item_name,
            expected_return_date,
        } => EmailTemplate {
            subject: format!("[{}] Rental approval requested - {}", brand, item_name),
            text: text_body(
                brand,
                &format!("{} has requested to rent {}.", user_name, item_name),
                &[
                    ("Item", item_name.clone()),
                    ("Expected return", fmt_date(expected_return_date)),
                    ("Requester", user_name.clone()),
                ],
                "Please sign in to the equipment system to review the request.",
            ),
            html: html_body(
                brand,
                "#2c3e50",
                "Rental approval requested",
                &format!("<strong>{}</strong> has submitted a new rental request.", escape(user_name)),
                &[
                    ("Item", escape(item_name)),
                    ("Expected return", fmt_date(expected_return_date)),
                    ("Requester", escape(user_name)),
                ],
                "Please sign in to the equipment system to review the request.",
            ),
        },
        Notification::RentalApproved {
            user_name,
            item_name,
            expected_return_date,
        } => EmailTemplate {
            subject: format!("[{}] Rental approved - {}", brand, item_name),
            text: text_body(
                brand,
                &format!("{}, your request to rent {} has been approved.", user_name, item_name),
                &[
                    ("Item", item_name.clone()),
                    ("Expected return", fmt_date(expected_return_date)),
                ],
                "Handle the equipment with care and return it by the expected date.",
            ),
            html: html_body(
                brand,
                "#27ae60",
                "Rental approved",
                &format!("<strong>{}</strong>, your rental request has been approved.", escape(user_name)),
                &[
                    ("Item", escape(item_name)),
                    ("Expected return", fmt_date(expected_return_date)),
                ],
                "Handle the equipment with care and return it by the expected date. \
                 Contact an administrator right away if anything goes wrong.",
            ),
        },
        Notification::RentalRejected {
            user_name,
            item_name,
            reason,
        } => {
            let mut text_rows = vec![("Item", item_name.clone())];
            let mut html_rows = vec![("Item", escape(item_name))];
            if let Some(reason) = reason.as_deref().filter(|r| !r.trim().is_empty()) {
                text_rows.push(("Reason", reason.to_string()));
                html_rows.push(("Reason", escape(reason)));
            }
            EmailTemplate {
                subject: format!("[{}] Rental request declined - {}", brand, item_name),
                text: text_body(
                    brand,
                    &format!("{}, your request to rent {} has been declined.", user_name, item_name),
                    &text_rows,
                    "Contact an administrator if you have any questions.",
                ),
                html: html_body(
                    brand,
                    "#e74c3c",
                    "Rental request declined",
                    &format!("<strong>{}</strong>, your rental request has been declined.", escape(user_name)),
                    &html_rows,
                    "Contact an administrator if you have any questions.",
                ),
            }
        }
        Notification::ReturnReminder {
            user_name,
            item_name,
            expected_return_date,
            days_left,
        } => EmailTemplate {
            subject: format!(
                "[{}] Return reminder - {} ({} {} left)",
                brand,
                item_name,
                days_left,
                plural_days(*days_left)
            ),
            text: text_body(
                brand,
                &format!(
                    "{}, {} is due back in {} {}.",
                    user_name,
                    item_name,
                    days_left,
                    plural_days(*days_left)
                ),
                &[
                    ("Item", item_name.clone()),
                    ("Expected return", fmt_date(expected_return_date)),
                    ("Days left", days_left.to_string()),
                ],
                "Please return the item by the expected date.",
            ),
            html: html_body(
                brand,
                if *days_left <= 1 { "#e74c3c" } else { "#f39c12" },
                "Return reminder",
                &format!(
                    "<strong>{}</strong>, the return date of your rental is approaching.",
                    escape(user_name)
                ),
                &[
                    ("Item", escape(item_name)),
                    ("Expected return", fmt_date(expected_return_date)),
                    ("Days left", days_left.to_string()),
                ],
                "Please return the item by the expected date.",
            ),
        },
        Notification::Overdue {
            user_name,
            item_name,
            expected_return_date,
            days_overdue,
        } => EmailTemplate {
            subject: format!(
                "[{}] Overdue return - {} ({} {} overdue)",
                brand,
                item_name,
                days_overdue,
                plural_days(*days_overdue)
            ),
            text: text_body(
                brand,
                &format!(
                    "{}, the return of {} is {} {} overdue.",
                    user_name,
                    item_name,
                    days_overdue,
                    plural_days(*days_overdue)
                ),
                &[
                    ("Item", item_name.clone()),
                    ("Expected return", fmt_date(expected_return_date)),
                    ("Days overdue", days_overdue.to_string()),
                ],
                "Please return the item immediately.",
            ),
            html: html_body(
                brand,
                "#e74c3c",
                "Overdue return",
                &format!("<strong>{}</strong>, your rental is overdue.", escape(user_name)),
                &[
                    ("Item", escape(item_name)),
                    ("Expected return", fmt_date(expected_return_date)),
                    ("Days overdue", days_overdue.to_string()),
                ],
                "Please return the item immediately.",
            ),
        },
    }
}

fn fmt_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn plural_days(n: i64) -> &'static str {
    if n == 1 {
        "day"
    } else {
        "days"
    }
}

fn text_body(brand: &str, lead: &str, rows: &[(&str, String)], closing: &str) -> String {
    let mut body = format!("{}\n\n", lead);
    for (label, value) in rows {
        body.push_str(&format!("- {}: {}\n", label, value));
    }
    body.push_str(&format!(
        "\n{}\n\n--\n{} equipment system\nThis message was sent automatically.",
        closing, brand
    ));
    body
}

/// `lead` and `rows` values must already be escaped
fn html_body(
    brand: &str,
    accent: &str,
    title: &str,
    lead: &str,
    rows: &[(&str, String)],
    closing: &str,
) -> String {
    let table: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<tr><td style="padding: 8px 0; font-weight: bold; width: 140px;">{}:</td><td style="padding: 8px 0;">{}</td></tr>"#,
                label, value
            )
        })
        .collect();

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background-color: #f8f9fa; padding: 20px; border-radius: 8px;">
    <h2 style="color: {accent}; margin-top: 0;">{title}</h2>
    <p style="font-size: 16px;">{lead}</p>
    <div style="background-color: white; padding: 20px; border-radius: 5px; margin: 20px 0;">
      <table style="width: 100%; border-collapse: collapse;">{table}</table>
    </div>
    <p>{closing}</p>
    <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
    <p style="font-size: 12px; color: #666;">{brand} equipment system<br>This message was sent automatically.</p>
  </div>
</div>"#,
        accent = accent,
        title = title,
        lead = lead,
        table = table,
        closing = closing,
        brand = escape(brand),
    )
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    #[test]
    fn request_mentions_requester_and_date() {
        let template = render(
            "Gear",
            &Notification::RentalRequest {
                user_name: "Kim".to_string(),
                item_name: "AR6120".to_string(),
                expected_return_date: date(),
            },
        );
        assert_eq!(template.subject, "[Gear] Rental approval requested - AR6120");
        assert!(template.text.contains("Requester: Kim"));
        assert!(template.text.contains("2026-05-04"));
        assert!(template.html.contains("2026-05-04"));
    }

    #[test]
    fn rejection_reason_is_optional() {
        let with_reason = render(
            "Gear",
            &Notification::RentalRejected {
                user_name: "Kim".to_string(),
                item_name: "S5735".to_string(),
                reason: Some("Out of stock".to_string()),
            },
        );
        assert!(with_reason.text.contains("Reason: Out of stock"));

        let without = render(
            "Gear",
            &Notification::RentalRejected {
                user_name: "Kim".to_string(),
                item_name: "S5735".to_string(),
                reason: None,
            },
        );
        assert!(!without.text.contains("Reason"));
        assert!(!without.html.contains("Reason"));
    }

    #[test]
    fn html_escapes_user_values() {
        let template = render(
            "Gear",
            &Notification::Overdue {
                user_name: "<script>".to_string(),
                item_name: "A&B".to_string(),
                expected_return_date: date(),
                days_overdue: 2,
            },
        );
        assert!(template.html.contains("&lt;script&gt;"));
        assert!(template.html.contains("A&amp;B"));
        assert!(!template.html.contains("<script>"));
        assert_eq!(template.subject, "[Gear] Overdue return - A&B (2 days overdue)");
    }

    #[test]
    fn reminder_uses_singular_day() {
        let template = render(
            "Gear",
            &Notification::ReturnReminder {
                user_name: "Kim".to_string(),
                item_name: "SFP".to_string(),
                expected_return_date: date(),
                days_left: 1,
            },
        );
        assert!(template.subject.ends_with("(1 day left)"));
        assert!(template.html.contains("#e74c3c"));
    }
}
