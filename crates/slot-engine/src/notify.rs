//! Confirmation and cancellation messages for a booked appointment.
//!
//! Only rendering happens here; delivery (email gateway, SMS API) belongs to
//! the caller. The [`NotificationLog`] stored on each appointment keeps sends
//! idempotent: [`pending_confirmations`] skips anything already marked sent.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::{Appointment, Service, StaffMember};

/// Which confirmations have already gone out for an appointment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationLog {
    pub sms_confirmation_sent: bool,
    pub email_confirmation_sent: bool,
    pub email_admin_confirmation_sent: bool,
}

impl NotificationLog {
    pub fn is_sent(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::ConfirmationSms => self.sms_confirmation_sent,
            NotificationKind::ConfirmationEmail => self.email_confirmation_sent,
            NotificationKind::AdminEmail => self.email_admin_confirmation_sent,
            NotificationKind::CancellationEmail | NotificationKind::AdminCancellationEmail => {
                false
            }
        }
    }

    pub fn mark_sent(&mut self, kind: NotificationKind) {
        match kind {
            NotificationKind::ConfirmationSms => self.sms_confirmation_sent = true,
            NotificationKind::ConfirmationEmail => self.email_confirmation_sent = true,
            NotificationKind::AdminEmail => self.email_admin_confirmation_sent = true,
            NotificationKind::CancellationEmail | NotificationKind::AdminCancellationEmail => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    ConfirmationSms,
    ConfirmationEmail,
    AdminEmail,
    CancellationEmail,
    AdminCancellationEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub channel: Channel,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
}

/// Everything a template may mention about one booking.
#[derive(Debug, Clone, Copy)]
pub struct BookingDetails<'a> {
    pub appointment: &'a Appointment,
    pub business_name: &'a str,
    pub admin_email: Option<&'a str>,
    pub service: Option<&'a Service>,
    pub staff: Option<&'a StaffMember>,
    /// Link to the page where the client can review or cancel.
    pub manage_url: Option<&'a str>,
}

impl BookingDetails<'_> {
    fn client_first_name(&self) -> Option<&str> {
        let client = self.appointment.client.as_ref()?;
        client
            .first_name
            .split_whitespace()
            .next()
            .or_else(|| client.last_name.split_whitespace().next())
    }

    fn service_title(&self) -> &str {
        self.service.map(|s| s.title.as_str()).unwrap_or("votre prestation")
    }

    fn staff_name(&self) -> String {
        self.staff
            .map(StaffMember::display_name)
            .unwrap_or_else(|| "notre équipe".to_string())
    }
}

/// International form for the SMS gateway: whitespace removed, a leading
/// national `0` replaced by the `33` country code.
pub fn format_phone_number(phone: &str) -> String {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.strip_prefix('0') {
        Some(rest) => format!("33{}", rest),
        None => compact,
    }
}

const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

fn french_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "lundi",
        Weekday::Tue => "mardi",
        Weekday::Wed => "mercredi",
        Weekday::Thu => "jeudi",
        Weekday::Fri => "vendredi",
        Weekday::Sat => "samedi",
        Weekday::Sun => "dimanche",
    }
}

/// `"lundi 19 octobre 2026"`.
pub fn french_date(date: NaiveDate) -> String {
    format!(
        "{} {} {} {}",
        french_weekday(date.weekday()),
        date.day(),
        FRENCH_MONTHS[date.month0() as usize],
        date.year()
    )
}

fn clock_time(at: NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

/// Renders the messages sent around a booking. Each method returns `None` when
/// the booking lacks what the message needs (no client, no admin address).
pub trait MessageRenderer {
    fn confirmation_sms(&self, details: &BookingDetails<'_>) -> Option<Notification>;
    fn confirmation_email(&self, details: &BookingDetails<'_>) -> Option<Notification>;
    fn admin_email(&self, details: &BookingDetails<'_>) -> Option<Notification>;
    fn cancellation_email(&self, details: &BookingDetails<'_>) -> Option<Notification>;
    fn admin_cancellation_email(&self, details: &BookingDetails<'_>) -> Option<Notification>;
}

/// Plain-text French templates.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrenchTemplates;

impl MessageRenderer for FrenchTemplates {
    fn confirmation_sms(&self, details: &BookingDetails<'_>) -> Option<Notification> {
        let client = details.appointment.client.as_ref()?;
        let start = details.appointment.start;
        Some(Notification {
            kind: NotificationKind::ConfirmationSms,
            channel: Channel::Sms,
            to: format_phone_number(&client.phone),
            subject: None,
            body: format!(
                "Bonjour {} ! votre rendez-vous est confirmé pour le {} à {}. À bientôt !",
                details.client_first_name().unwrap_or_default(),
                french_date(start.date()),
                clock_time(start)
            ),
        })
    }

    fn confirmation_email(&self, details: &BookingDetails<'_>) -> Option<Notification> {
        let client = details.appointment.client.as_ref()?;
        let start = details.appointment.start;
        let mut body = format!(
            "Bonjour {},\n\n\
             Votre rendez-vous chez {} est confirmé !\n\n\
             Prestation : {}\n\
             Date : {}\n\
             Heure : {}\n\
             Avec : {}\n",
            details.client_first_name().unwrap_or_default(),
            details.business_name,
            details.service_title(),
            french_date(start.date()),
            clock_time(start),
            details.staff_name(),
        );
        if let Some(service) = details.service {
            body.push_str(&format!("Durée : {}\nPrix : {}€\n", service.duration, service.price));
        }
        if let Some(url) = details.manage_url {
            body.push_str(&format!("\nGérer ou annuler votre rendez-vous : {}\n", url));
        }
        Some(Notification {
            kind: NotificationKind::ConfirmationEmail,
            channel: Channel::Email,
            to: client.email.clone(),
            subject: Some(format!(
                "Confirmation de votre rendez-vous chez {}",
                details.business_name
            )),
            body,
        })
    }

    fn admin_email(&self, details: &BookingDetails<'_>) -> Option<Notification> {
        let admin = details.admin_email?;
        let client = details.appointment.client.as_ref()?;
        let start = details.appointment.start;
        Some(Notification {
            kind: NotificationKind::AdminEmail,
            channel: Channel::Email,
            to: admin.to_string(),
            subject: Some(format!("Nouveau rendez-vous : {}", client.full_name())),
            body: format!(
                "Nouvelle réservation\n\n\
                 Client : {}\n\
                 Prestation : {}\n\
                 Date : {}\n\
                 Heure : {}\n\
                 Avec : {}\n\
                 Email : {}\n\
                 Téléphone : {}\n",
                client.full_name(),
                details.service_title(),
                french_date(start.date()),
                clock_time(start),
                details.staff_name(),
                client.email,
                client.phone,
            ),
        })
    }

    fn cancellation_email(&self, details: &BookingDetails<'_>) -> Option<Notification> {
        let client = details.appointment.client.as_ref()?;
        let start = details.appointment.start;
        Some(Notification {
            kind: NotificationKind::CancellationEmail,
            channel: Channel::Email,
            to: client.email.clone(),
            subject: Some(format!(
                "Annulation de votre rendez-vous chez {}",
                details.business_name
            )),
            body: format!(
                "Bonjour {},\n\n\
                 Votre rendez-vous du {} à {} ({}) a bien été annulé.\n",
                details.client_first_name().unwrap_or_default(),
                french_date(start.date()),
                clock_time(start),
                details.service_title(),
            ),
        })
    }

    fn admin_cancellation_email(&self, details: &BookingDetails<'_>) -> Option<Notification> {
        let admin = details.admin_email?;
        let client = details.appointment.client.as_ref()?;
        let start = details.appointment.start;
        Some(Notification {
            kind: NotificationKind::AdminCancellationEmail,
            channel: Channel::Email,
            to: admin.to_string(),
            subject: Some(format!("Rendez-vous annulé : {}", client.full_name())),
            body: format!(
                "Annulation d'un rendez-vous\n\n\
                 Client : {}\n\
                 Prestation : {}\n\
                 Date : {}\n\
                 Heure : {}\n\
                 Avec : {}\n\
                 Email : {}\n\
                 Téléphone : {}\n",
                client.full_name(),
                details.service_title(),
                french_date(start.date()),
                clock_time(start),
                details.staff_name(),
                client.email,
                client.phone,
            ),
        })
    }
}

/// Confirmation messages not yet sent for this booking.
///
/// Cancelled appointments get none.
pub fn pending_confirmations(
    details: &BookingDetails<'_>,
    renderer: &dyn MessageRenderer,
) -> Vec<Notification> {
    if !details.appointment.is_confirmed() {
        return Vec::new();
    }
    let log = details.appointment.notifications;
    [
        (NotificationKind::ConfirmationEmail, renderer.confirmation_email(details)),
        (NotificationKind::AdminEmail, renderer.admin_email(details)),
        (NotificationKind::ConfirmationSms, renderer.confirmation_sms(details)),
    ]
    .into_iter()
    .filter(|(kind, _)| !log.is_sent(*kind))
    .filter_map(|(_, notification)| notification)
    .collect()
}

/// Messages announcing a cancellation: the client email, then the business
/// notice when an admin address is known.
pub fn cancellation_notices(
    details: &BookingDetails<'_>,
    renderer: &dyn MessageRenderer,
) -> Vec<Notification> {
    [
        renderer.cancellation_email(details),
        renderer.admin_cancellation_email(details),
    ]
    .into_iter()
    .flatten()
    .collect()
}
