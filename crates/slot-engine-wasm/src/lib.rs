//! WASM bindings for slot-engine.
//!
//! Exposes availability resolution and staff selection to the booking widget
//! via `wasm-bindgen`. All complex types cross the boundary as JSON strings in
//! the same camelCase shape the calendar store uses.
//!
//! Each export is a thin wrapper over a plain `*_json` function returning
//! `Result<String, String>`, so the logic can be tested natively.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir widget/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use slot_engine::booking::{select_slot, FirstEligible, RandomPicker, StaffPicker};
use slot_engine::calendar::{StaffId, TimeSlot};
use slot_engine::config::EngineConfig;
use slot_engine::resolve::{resolve_availability, AvailabilityQuery, Resolution};
use slot_engine::scan::AvailabilityNotice;
use slot_engine::source::MemoryCalendar;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionDto {
    #[serde(flatten)]
    resolution: Resolution,
    notice: AvailabilityNotice,
    /// Ready-to-display text for the notice, absent when slots were found in
    /// the requested week.
    message: Option<String>,
}

impl From<Resolution> for ResolutionDto {
    fn from(resolution: Resolution) -> Self {
        let notice = resolution.notice();
        Self {
            message: notice.message(),
            notice,
            resolution,
        }
    }
}

/// A slot as rendered by the widget, with the date it belongs to.
#[derive(Deserialize)]
struct SlotInput {
    date: NaiveDate,
    #[serde(flatten)]
    slot: TimeSlot,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a local wall-clock time, with or without seconds.
fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// Native entry points
// ---------------------------------------------------------------------------

/// See [`resolve_availability_js`].
pub fn resolve_availability_json(
    snapshot_json: &str,
    query_json: &str,
    now: &str,
    config_json: Option<&str>,
) -> Result<String, String> {
    let calendar = MemoryCalendar::from_json_str(snapshot_json).map_err(|e| e.to_string())?;
    let query: AvailabilityQuery =
        serde_json::from_str(query_json).map_err(|e| format!("Invalid query JSON: {}", e))?;
    let now = parse_now(now)?;
    let config = match config_json {
        Some(json) => EngineConfig::from_json_str(json).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };

    let resolution =
        resolve_availability(&calendar, &query, now, &config).map_err(|e| e.to_string())?;
    to_json(&ResolutionDto::from(resolution))
}

/// See [`select_slot_js`].
pub fn select_slot_json(
    slot_json: &str,
    preference: Option<&str>,
    seed: Option<u64>,
) -> Result<String, String> {
    let input: SlotInput =
        serde_json::from_str(slot_json).map_err(|e| format!("Invalid slot JSON: {}", e))?;
    let preference = preference.map(StaffId::new);

    let mut seeded;
    let mut first = FirstEligible;
    let picker: &mut dyn StaffPicker = match seed {
        Some(seed) => {
            seeded = RandomPicker::seeded(seed);
            &mut seeded
        }
        // Without a seed the host is expected to randomise; the first eligible
        // staff member keeps the export deterministic.
        None => &mut first,
    };

    let selection = select_slot(input.date, &input.slot, preference.as_ref(), picker);
    to_json(&selection)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Resolve availability for one business from a calendar snapshot.
///
/// # Arguments
/// - `snapshot_json` -- calendar snapshot (`businesses`, `staff`, `staffHours`,
///   `vacations`, `appointments`)
/// - `query_json` -- `{businessId, serviceDurationMinutes, weekStart, staffPreference?}`
/// - `now` -- local wall-clock time, e.g. "2026-10-19T14:05"
/// - `config_json` -- optional engine config (`slotStepMinutes`, `maxWeeksToScan`, ...)
///
/// Returns the resolution as JSON with `notice` and `message` fields added.
#[wasm_bindgen(js_name = "resolveAvailability")]
pub fn resolve_availability_js(
    snapshot_json: &str,
    query_json: &str,
    now: &str,
    config_json: Option<String>,
) -> Result<String, JsValue> {
    resolve_availability_json(snapshot_json, query_json, now, config_json.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Pick the staff member for a slot the client clicked.
///
/// `slot_json` is `{date, time, availableStaff}`. With a `preference`, returns
/// it only when eligible. Otherwise picks uniformly at random using `seed`, or
/// the first eligible staff member when no seed is given. Returns
/// `{date, time, staffId}` or `null`.
#[wasm_bindgen(js_name = "selectSlot")]
pub fn select_slot_js(
    slot_json: &str,
    preference: Option<String>,
    seed: Option<u64>,
) -> Result<String, JsValue> {
    select_slot_json(slot_json, preference.as_deref(), seed).map_err(|e| JsValue::from_str(&e))
}
