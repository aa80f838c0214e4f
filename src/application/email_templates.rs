use url::Url;

const BRAND_NAME: &str = "Blog";

fn origin_label(app_origin: &str) -> String {
    Url::parse(app_origin)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()))
        .unwrap_or_else(|| app_origin.to_string())
}

/// Minimal escaping for user-supplied text placed into HTML bodies.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

pub fn code_block(code: &str) -> String {
    format!(
        r#"<div style="margin:16px 0;padding:14px 18px;background-color:#111827;color:#ffffff;border-radius:8px;font-size:24px;font-weight:700;letter-spacing:0.3em;text-align:center;font-family:'Courier New',monospace;">{code}</div>"#,
        code = escape(code)
    )
}

pub fn welcome_email(app_origin: &str, name: &str, code: &str) -> (String, String) {
    let subject = format!("{}, welcome to {}", name, BRAND_NAME);
    let headline = "Verify your email";
    let lead = format!(
        "Hi <strong>{}</strong>, thanks for signing up. Use the code below to verify your email address.",
        escape(name)
    );
    let body = format!(
        r#"{}<p style="margin:12px 0 0;color:#374151;">The code expires in 5 hours and can only be used once.</p>"#,
        code_block(code)
    );
    let reason = format!("you created an account on {}", BRAND_NAME);

    let html = wrap_email(app_origin, headline, &lead, &body, &reason, None);
    (subject, html)
}

pub fn login_code_email(app_origin: &str, name: &str, code: &str) -> (String, String) {
    let subject = format!("{} login token", name);
    let headline = "Your login code";
    let lead = format!(
        "Hi <strong>{}</strong>, here is the code you asked for to sign in.",
        escape(name)
    );
    let body = format!(
        r#"{}<p style="margin:12px 0 0;color:#374151;">Enter it on the sign-in page. It expires in 5 hours.</p>"#,
        code_block(code)
    );
    let reason = format!("someone requested a login code for your {} account", BRAND_NAME);

    let html = wrap_email(app_origin, headline, &lead, &body, &reason, None);
    (subject, html)
}

pub fn login_alert_email(
    app_origin: &str,
    name: &str,
    location: &str,
    device: &str,
) -> (String, String) {
    let subject = format!("🚨 security alert for {} 🚨", name.to_lowercase());
    let headline = "New sign-in to your account";
    let lead = format!(
        "Hi <strong>{}</strong>, your account was just signed in to.",
        escape(name)
    );
    let body = format!(
        r#"<ul style="margin:12px 0;color:#374151;padding-left:20px;">
          <li>Location: <strong>{location}</strong></li>
          <li>Device: <strong>{device}</strong></li>
        </ul>"#,
        location = escape(location),
        device = escape(device),
    );
    let reason = format!("a new session was started on your {} account", BRAND_NAME);
    let note = "If this wasn't you, request a new login code to sign out and review your profile.";

    let html = wrap_email(app_origin, headline, &lead, &body, &reason, Some(note));
    (subject, html)
}

pub fn wrap_email(
    app_origin: &str,
    headline: &str,
    lead: &str,
    body_html: &str,
    reason: &str,
    footer_note: Option<&str>,
) -> String {
    let origin = origin_label(app_origin);

    let footer_note = footer_note
        .map(|note| {
            format!(
                r#"<p style="margin:8px 0 0;color:#4b5563;font-size:13px;">{}</p>"#,
                note
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <body style="background:#f8fafc;margin:0;padding:24px;font-family:Arial,Helvetica,sans-serif;">
    <div style="max-width:560px;margin:0 auto;background:#ffffff;border:1px solid #e5e7eb;border-radius:12px;padding:24px;">
      <div style="font-size:12px;letter-spacing:0.08em;text-transform:uppercase;color:#6b7280;">{brand} - {origin}</div>
      <h1 style="margin:12px 0 8px;font-size:22px;color:#111827;">{headline}</h1>
      <p style="margin:0 0 12px;font-size:15px;color:#111827;line-height:1.6;">{lead}</p>
      {body_html}
      <div style="margin-top:20px;padding-top:16px;border-top:1px solid #e5e7eb;">
        <p style="margin:0 0 6px;font-size:13px;color:#4b5563;">Why you got this email: {reason}.</p>
        <p style="margin:0;font-size:13px;color:#4b5563;">If you didn't request this, you can safely ignore it.</p>
        {footer_note}
      </div>
    </div>
  </body>
</html>
"#,
        brand = BRAND_NAME,
    )
}
