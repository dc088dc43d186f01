//! Calendar tools (`googlecalendar` app).

use serde::Deserialize;
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::{ToolError, finish, object_schema, parse_args, render_list, str_field};
use crate::remote::{ActionInput, App, Param, RemoteActions};

const APP: App = App::GoogleCalendar;

/// Display cap for event lists.
pub const EVENT_LIST_CAP: usize = 10;
/// Display cap for the calendar list.
pub const CALENDAR_LIST_CAP: usize = 20;
pub const DEFAULT_UPCOMING_COUNT: u32 = 10;

pub const NO_EVENT_WITH_TITLE: &str = "No events found with the given title.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarTool {
    GetEventIdByTitle,
    CreateEvent,
    FindEvents,
    UpdateEvent,
    DeleteEvent,
    QuickAddEvent,
    RemoveAttendee,
    ListUpcomingEvents,
    AddAttendee,
    GetEventDetails,
    ListCalendars,
}

// =============================================================================
// ARGUMENTS
// =============================================================================

#[derive(Deserialize)]
struct TitleArgs {
    title: String,
}

#[derive(Deserialize)]
struct CreateEventArgs {
    start_datetime: String,
    end_datetime: String,
    title: String,
    #[serde(default)]
    description: Param<String>,
    #[serde(default, rename = "eventType")]
    event_type: Param<String>,
    #[serde(default)]
    create_meeting_room: Param<bool>,
    #[serde(default, rename = "guestsCanSeeOtherGuests")]
    guests_can_see_other_guests: Param<bool>,
    #[serde(default, rename = "guestsCanInviteOthers")]
    guests_can_invite_others: Param<bool>,
    #[serde(default)]
    location: Param<String>,
    #[serde(default)]
    visibility: Param<String>,
    #[serde(default)]
    attendees: Param<Vec<String>>,
    #[serde(default)]
    send_updates: Param<bool>,
    #[serde(default)]
    guests_can_modify: Param<bool>,
    #[serde(default)]
    calendar_id: Param<String>,
}

#[derive(Deserialize)]
struct FindEventsArgs {
    #[serde(default)]
    query: Param<String>,
    #[serde(default)]
    max_results: Param<u32>,
    #[serde(default)]
    time_max: Param<String>,
    #[serde(default)]
    time_min: Param<String>,
    #[serde(default)]
    event_types: Param<String>,
    #[serde(default)]
    calendar_id: Param<String>,
}

#[derive(Deserialize)]
struct UpdateEventArgs {
    event_id: String,
    #[serde(default)]
    start_datetime: Param<String>,
    #[serde(default)]
    end_datetime: Param<String>,
    #[serde(default)]
    title: Param<String>,
    #[serde(default)]
    description: Param<String>,
}

#[derive(Deserialize)]
struct EventArgs {
    event_id: String,
    #[serde(default)]
    calendar_id: Param<String>,
}

#[derive(Deserialize)]
struct QuickAddArgs {
    #[serde(default)]
    calendar_id: Param<String>,
    #[serde(default)]
    text: Param<String>,
    #[serde(default)]
    send_updates: Param<String>,
}

#[derive(Deserialize)]
struct AttendeeArgs {
    event_id: String,
    attendee_email: String,
    #[serde(default)]
    calendar_id: Param<String>,
}

#[derive(Deserialize)]
struct UpcomingArgs {
    #[serde(default)]
    max_results: Param<u32>,
    #[serde(default)]
    calendar_id: Param<String>,
}

// =============================================================================
// DEFINITIONS
// =============================================================================

impl CalendarTool {
    pub const ALL: [Self; 11] = [
        Self::GetEventIdByTitle,
        Self::CreateEvent,
        Self::FindEvents,
        Self::UpdateEvent,
        Self::DeleteEvent,
        Self::QuickAddEvent,
        Self::RemoveAttendee,
        Self::ListUpcomingEvents,
        Self::AddAttendee,
        Self::GetEventDetails,
        Self::ListCalendars,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GetEventIdByTitle => "get_event_id_by_title",
            Self::CreateEvent => "create_event",
            Self::FindEvents => "find_events",
            Self::UpdateEvent => "update_event",
            Self::DeleteEvent => "delete_event",
            Self::QuickAddEvent => "quick_add_event",
            Self::RemoveAttendee => "remove_attendee",
            Self::ListUpcomingEvents => "list_upcoming_events",
            Self::AddAttendee => "add_attendee",
            Self::GetEventDetails => "get_event_details",
            Self::ListCalendars => "list_calendars",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::GetEventIdByTitle => {
                "Look up the ID of the first event matching a title. Use the ID with update, delete and attendee tools."
            }
            Self::CreateEvent => "Create a new event in Google Calendar. Datetimes are ISO 8601.",
            Self::FindEvents => "Find events matching a search query and/or a time window.",
            Self::UpdateEvent => "Update an existing event's time, title or description.",
            Self::DeleteEvent => "Delete an event by ID.",
            Self::QuickAddEvent => {
                "Create an event from a short text like 'Lunch with Sam tomorrow 12pm'. Only use when create_event cannot express the request."
            }
            Self::RemoveAttendee => "Remove an attendee (by email) from an event.",
            Self::ListUpcomingEvents => "List the next upcoming events, soonest first.",
            Self::AddAttendee => "Add an attendee (by email) to an event.",
            Self::GetEventDetails => "Show title, time, description, location, attendees and meeting link of an event.",
            Self::ListCalendars => "List the calendars available to the user.",
        }
    }

    #[must_use]
    pub fn input_schema(self) -> Value {
        let calendar_id = json!({ "type": "string", "description": "Calendar ID; 'primary' for the main calendar." });
        match self {
            Self::GetEventIdByTitle => object_schema(json!({ "title": { "type": "string" } }), &["title"]),
            Self::CreateEvent => object_schema(
                json!({
                    "start_datetime": { "type": "string", "description": "ISO 8601 start." },
                    "end_datetime": { "type": "string", "description": "ISO 8601 end." },
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "eventType": { "type": "string", "enum": ["default", "outOfOffice", "focusTime", "workingLocation"] },
                    "create_meeting_room": { "type": "boolean", "description": "Attach a Google Meet link." },
                    "guestsCanSeeOtherGuests": { "type": "boolean" },
                    "guestsCanInviteOthers": { "type": "boolean" },
                    "location": { "type": "string" },
                    "visibility": { "type": "string", "enum": ["default", "public", "private", "confidential"] },
                    "attendees": { "type": "array", "items": { "type": "string" }, "description": "Attendee emails only." },
                    "send_updates": { "type": "boolean" },
                    "guests_can_modify": { "type": "boolean" },
                    "calendar_id": calendar_id,
                }),
                &["start_datetime", "end_datetime", "title"],
            ),
            Self::FindEvents => object_schema(
                json!({
                    "query": { "type": "string" },
                    "max_results": { "type": "integer" },
                    "time_max": { "type": "string", "description": "RFC 3339 upper bound." },
                    "time_min": { "type": "string", "description": "RFC 3339 lower bound." },
                    "event_types": { "type": "string" },
                    "calendar_id": calendar_id,
                }),
                &[],
            ),
            Self::UpdateEvent => object_schema(
                json!({
                    "event_id": { "type": "string" },
                    "start_datetime": { "type": "string" },
                    "end_datetime": { "type": "string" },
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                }),
                &["event_id"],
            ),
            Self::DeleteEvent | Self::GetEventDetails => object_schema(
                json!({ "event_id": { "type": "string" }, "calendar_id": calendar_id }),
                &["event_id"],
            ),
            Self::QuickAddEvent => object_schema(
                json!({
                    "calendar_id": calendar_id,
                    "text": { "type": "string" },
                    "send_updates": { "type": "string", "enum": ["all", "externalOnly", "none"] },
                }),
                &[],
            ),
            Self::RemoveAttendee | Self::AddAttendee => object_schema(
                json!({
                    "event_id": { "type": "string" },
                    "attendee_email": { "type": "string" },
                    "calendar_id": calendar_id,
                }),
                &["event_id", "attendee_email"],
            ),
            Self::ListUpcomingEvents => object_schema(
                json!({ "max_results": { "type": "integer", "default": DEFAULT_UPCOMING_COUNT }, "calendar_id": calendar_id }),
                &[],
            ),
            Self::ListCalendars => object_schema(json!({}), &[]),
        }
    }

    // =========================================================================
    // EXECUTION
    // =========================================================================

    /// # Errors
    ///
    /// Returns [`ToolError::InvalidInput`] when `args` do not match the schema.
    pub async fn run(self, remote: &dyn RemoteActions, connection_id: &str, args: &Value) -> Result<String, ToolError> {
        let name = self.name();
        let text = match self {
            Self::GetEventIdByTitle => {
                let a: TitleArgs = parse_args(name, args)?;
                let input = ActionInput::new().required("query", a.title);
                let env = remote.execute(connection_id, APP, "find_event", input).await;
                finish(&env, APP, "looking up the event", |r| {
                    events(r)
                        .and_then(|list| list.first())
                        .and_then(|event| event.get("id"))
                        .and_then(Value::as_str)
                        .map_or_else(|| NO_EVENT_WITH_TITLE.to_string(), str::to_string)
                })
            }
            Self::CreateEvent => {
                let a: CreateEventArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("start_datetime", a.start_datetime)
                    .required("end_datetime", a.end_datetime)
                    .required("summary", a.title)
                    .optional("description", &a.description)
                    .optional("eventType", &a.event_type)
                    .optional("create_meeting_room", &a.create_meeting_room)
                    .optional("guestsCanSeeOtherGuests", &a.guests_can_see_other_guests)
                    .optional("guestsCanInviteOthers", &a.guests_can_invite_others)
                    .optional("location", &a.location)
                    .optional("visibility", &a.visibility)
                    .optional("attendees", &a.attendees)
                    .optional("send_updates", &a.send_updates)
                    .optional("guests_can_modify", &a.guests_can_modify)
                    .optional("calendar_id", &a.calendar_id);
                let env = remote.execute(connection_id, APP, "create_event", input).await;
                finish(&env, APP, "creating the event", |r| {
                    match r.get("htmlLink").and_then(Value::as_str) {
                        Some(link) => format!("Created the event successfully!\n{link}"),
                        None => "Created the event successfully!".to_string(),
                    }
                })
            }
            Self::FindEvents => {
                let a: FindEventsArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .optional("query", &a.query)
                    .optional("max_results", &a.max_results)
                    .optional("time_max", &a.time_max)
                    .optional("time_min", &a.time_min)
                    .optional("event_types", &a.event_types)
                    .optional("calendar_id", &a.calendar_id);
                let env = remote.execute(connection_id, APP, "find_event", input).await;
                finish(&env, APP, "finding events", |r| {
                    render_list(events(r), EVENT_LIST_CAP, "Found events:", "No events found.", "\n", |event| {
                        event
                            .get("summary")
                            .and_then(Value::as_str)
                            .map(|summary| format!("- `{summary}`"))
                    })
                })
            }
            Self::UpdateEvent => {
                let a: UpdateEventArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("event_id", a.event_id)
                    .optional("start_datetime", &a.start_datetime)
                    .optional("end_datetime", &a.end_datetime)
                    .optional("summary", &a.title)
                    .optional("description", &a.description);
                let env = remote.execute(connection_id, APP, "update_event", input).await;
                finish(&env, APP, "updating the event", |_| "Event updated successfully.".to_string())
            }
            Self::DeleteEvent => {
                let a: EventArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("event_id", a.event_id)
                    .optional("calendar_id", &a.calendar_id);
                let env = remote.execute(connection_id, APP, "delete_event", input).await;
                finish(&env, APP, "deleting the event", |_| "The event was deleted successfully.".to_string())
            }
            Self::QuickAddEvent => {
                let a: QuickAddArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .optional("calendar_id", &a.calendar_id)
                    .optional("text", &a.text)
                    .optional("send_updates", &a.send_updates);
                let env = remote.execute(connection_id, APP, "quick_add", input).await;
                finish(&env, APP, "creating a quick event", |_| "Quick event created successfully.".to_string())
            }
            Self::RemoveAttendee => {
                let a: AttendeeArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("event_id", a.event_id)
                    .required("attendee_email", a.attendee_email)
                    .optional("calendar_id", &a.calendar_id);
                let env = remote.execute(connection_id, APP, "remove_attendee", input).await;
                finish(&env, APP, "removing the attendee from the event", |_| {
                    "Attendee removed successfully.".to_string()
                })
            }
            Self::ListUpcomingEvents => {
                let a: UpcomingArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("time_min", now_rfc3339())
                    .required("max_results", a.max_results.unwrap_or(DEFAULT_UPCOMING_COUNT))
                    .required("order_by", "startTime")
                    .required("single_events", true)
                    .optional("calendar_id", &a.calendar_id);
                let env = remote.execute(connection_id, APP, "find_event", input).await;
                finish(&env, APP, "listing upcoming events", |r| {
                    render_list(events(r), EVENT_LIST_CAP, "**Upcoming Events:**", "No upcoming events found.", "\n", |event| {
                        Some(format!("- **{}** - {}", str_field(event, "summary", "No Title"), start_of(event)))
                    })
                })
            }
            Self::AddAttendee => {
                let a: AttendeeArgs = parse_args(name, args)?;
                let email = a.attendee_email.clone();
                let input = ActionInput::new()
                    .required("event_id", a.event_id)
                    .required("attendee_email", a.attendee_email)
                    .optional("calendar_id", &a.calendar_id);
                let env = remote.execute(connection_id, APP, "add_attendee", input).await;
                finish(&env, APP, "adding the attendee to the event", |_| {
                    format!("Successfully added {email} to the event.")
                })
            }
            Self::GetEventDetails => {
                let a: EventArgs = parse_args(name, args)?;
                let input = ActionInput::new()
                    .required("event_id", a.event_id)
                    .optional("calendar_id", &a.calendar_id);
                let env = remote.execute(connection_id, APP, "get_event", input).await;
                finish(&env, APP, "getting event details", render_event_details)
            }
            Self::ListCalendars => {
                let env = remote
                    .execute(connection_id, APP, "list_calendars", ActionInput::new())
                    .await;
                finish(&env, APP, "listing calendars", |r| {
                    let items = r.get("items").and_then(Value::as_array);
                    render_list(items, CALENDAR_LIST_CAP, "**Your Calendars:**", "No calendars found.", "\n", |cal| {
                        let primary = if cal.get("primary").and_then(Value::as_bool).unwrap_or(false) {
                            " (Primary)"
                        } else {
                            ""
                        };
                        Some(format!(
                            "- **{}**{primary} - `{}`",
                            str_field(cal, "summary", "Unknown"),
                            str_field(cal, "id", "")
                        ))
                    })
                })
            }
        };
        Ok(text)
    }
}

// =============================================================================
// RENDERING
// =============================================================================

fn events(response: &Value) -> Option<&Vec<Value>> {
    response.get("event_data").and_then(Value::as_array)
}

/// `dateTime` for timed events, `date` for all-day events.
fn start_of(event: &Value) -> &str {
    time_of(event, "start").unwrap_or("No time")
}

fn time_of<'a>(event: &'a Value, key: &str) -> Option<&'a str> {
    let slot = event.get(key)?;
    slot.get("dateTime")
        .or_else(|| slot.get("date"))
        .and_then(Value::as_str)
}

fn render_event_details(event: &Value) -> String {
    let mut details = Vec::new();
    if let Some(summary) = event.get("summary").and_then(Value::as_str) {
        details.push(format!("**Title:** {summary}"));
    }
    if let Some(start) = time_of(event, "start") {
        details.push(format!("**Start:** {start}"));
    }
    if let Some(end) = time_of(event, "end") {
        details.push(format!("**End:** {end}"));
    }
    if let Some(description) = event.get("description").and_then(Value::as_str) {
        details.push(format!("**Description:** {description}"));
    }
    if let Some(location) = event.get("location").and_then(Value::as_str) {
        details.push(format!("**Location:** {location}"));
    }
    if let Some(attendees) = event.get("attendees").and_then(Value::as_array) {
        let emails: Vec<&str> = attendees.iter().map(|a| str_field(a, "email", "")).collect();
        details.push(format!("**Attendees:** {}", emails.join(", ")));
    }
    if let Some(link) = event.get("hangoutLink").and_then(Value::as_str) {
        details.push(format!("**Meeting Link:** {link}"));
    }
    if details.is_empty() {
        return "No details available for this event.".to_string();
    }
    format!("**Event Details:**\n{}", details.join("\n"))
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
#[path = "calendar_test.rs"]
mod tests;
