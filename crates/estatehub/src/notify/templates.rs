//! Email bodies for the onboarding and enquiry flows.

use super::mailer::EmailMessage;
use crate::contact::phone_digits;
use crate::leads::Enquiry;

const BRAND: &str = "EstateHub";

/// Escapes text for interpolation into HTML bodies.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn wrap(body: &str) -> String {
    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;\">{body}</div>"
    )
}

pub fn otp_email(to: &str, code: &str, ttl_minutes: i64) -> EmailMessage {
    let html = wrap(&format!(
        "<h2 style=\"color: #0a2540;\">{BRAND} - Email Verification</h2>\
         <p>Your OTP code for builder registration is:</p>\
         <div style=\"background: #f0f0f0; padding: 20px; text-align: center; margin: 20px 0; border-radius: 8px;\">\
         <span style=\"font-size: 32px; font-weight: bold; letter-spacing: 8px; color: #0a2540;\">{code}</span></div>\
         <p style=\"color: #666;\">This code will expire in {ttl_minutes} minutes.</p>\
         <p style=\"color: #666; font-size: 12px;\">If you didn't request this, please ignore this email.</p>",
        code = escape_html(code),
    ));

    EmailMessage {
        to: to.to_string(),
        subject: format!("Your OTP for {BRAND} Builder Registration"),
        html,
        text: Some(format!(
            "Your {BRAND} verification code is {code}. It expires in {ttl_minutes} minutes."
        )),
    }
}

pub fn approval_email(to: &str, name: &str, temporary_password: &str, login_url: &str) -> EmailMessage {
    let html = wrap(&format!(
        "<h2 style=\"color: #10b981;\">Account Approved!</h2>\
         <p>Congratulations, <strong>{name}</strong>!</p>\
         <p>Your builder account has been approved.</p>\
         <div style=\"background: #f0f0f0; padding: 20px; margin: 20px 0; border-radius: 8px;\">\
         <h3 style=\"margin-top: 0;\">Login Credentials:</h3>\
         <p><strong>Email:</strong> {email}</p>\
         <p><strong>Temporary password:</strong> <code>{password}</code></p>\
         <a href=\"{login_url}\" style=\"display: inline-block; background: #0a2540; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px;\">Login Now</a>\
         </div>\
         <p style=\"color: #ef4444;\">Change your password after first login.</p>",
        name = escape_html(name),
        email = escape_html(to),
        password = escape_html(temporary_password),
        login_url = escape_html(login_url),
    ));

    EmailMessage {
        to: to.to_string(),
        subject: format!("Your {BRAND} Builder Account is Approved!"),
        html,
        text: Some(format!(
            "Congratulations {name}, your builder account is approved.\n\
             Email: {to}\nTemporary password: {temporary_password}\nLogin: {login_url}\n\
             Change your password after first login."
        )),
    }
}

pub fn rejection_email(to: &str, name: &str, reason: Option<&str>) -> EmailMessage {
    let reason_html = reason
        .map(|reason| format!("<p><strong>Reason:</strong> {}</p>", escape_html(reason)))
        .unwrap_or_default();
    let html = wrap(&format!(
        "<h2 style=\"color: #ef4444;\">Application Update</h2>\
         <p>Dear <strong>{name}</strong>,</p>\
         <p>We regret to inform you that we cannot approve your builder account at this time.</p>\
         {reason_html}\
         <p>If you believe this is an error, please contact our support team.</p>\
         <p style=\"color: #666; margin-top: 30px;\">Best regards,<br>{BRAND} Team</p>",
        name = escape_html(name),
    ));

    EmailMessage {
        to: to.to_string(),
        subject: format!("{BRAND} Builder Application Update"),
        html,
        text: None,
    }
}

pub fn enquiry_email(recipient: &str, enquiry: &Enquiry) -> EmailMessage {
    let not_available = "N/A";
    let property = enquiry.property_title.as_deref().unwrap_or(not_available);
    let property_url = enquiry.property_url.as_deref().unwrap_or(not_available);
    let email = enquiry.email.as_deref().unwrap_or("Not provided");
    let message = enquiry.message.as_deref().unwrap_or("No message");
    let digits = phone_digits(&enquiry.phone);

    let text = format!(
        "New Property Enquiry from {BRAND}\n\n\
         Property: {property}\nView Property: {property_url}\n\n\
         Customer Details:\nName: {name}\nPhone: {phone}\nEmail: {email}\n\n\
         Message:\n{message}\n\nSent from {BRAND} Property Portal",
        name = enquiry.name,
        phone = enquiry.phone,
    );

    let html = wrap(&format!(
        "<h2 style=\"color: #0a2540;\">Property Details</h2>\
         <p><strong>Property:</strong> {property}</p>\
         <p><a href=\"{property_url}\">View Property on Website</a></p>\
         <h2 style=\"color: #0a2540;\">Customer Details</h2>\
         <p><strong>Name:</strong> {name}</p>\
         <p><strong>Phone:</strong> <a href=\"tel:{phone}\">{phone}</a></p>\
         <p><strong>Email:</strong> {email}</p>\
         <h2 style=\"color: #0a2540;\">Message</h2>\
         <p style=\"background-color: #f9f9f9; padding: 15px;\">{message}</p>\
         <p><a href=\"https://wa.me/{digits}\">WhatsApp</a> | <a href=\"tel:{phone}\">Call</a></p>\
         <p style=\"color: #666; font-size: 12px;\">Sent from {BRAND} Property Portal</p>",
        property = escape_html(property),
        property_url = escape_html(property_url),
        name = escape_html(&enquiry.name),
        phone = escape_html(&enquiry.phone),
        email = escape_html(email),
        message = escape_html(message),
    ));

    EmailMessage {
        to: recipient.to_string(),
        subject: format!("New Property Enquiry from {}", enquiry.name),
        html,
        text: Some(text),
    }
}
