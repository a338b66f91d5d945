use std::collections::{BTreeMap, HashMap};

use paddla_core::models::MAX_NAME_LEN;
use paddla_core::{CoreError, CoreResult};

/// Raw name fields for one canoe slot as they arrived from the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ParticipantInput {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
        }
    }
}

/// Name fields keyed by 1-based canoe slot. Slots may be missing.
#[derive(Debug, Clone, Default)]
pub struct Participants {
    slots: BTreeMap<usize, ParticipantInput>,
}

impl Participants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot numbering follows iteration order, starting at 1.
    pub fn from_inputs(inputs: impl IntoIterator<Item = ParticipantInput>) -> Self {
        let slots = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| (i + 1, input))
            .collect();
        Self { slots }
    }

    /// Collects `canoe{N}_fname` / `canoe{N}_lname` fields from a booking form.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let mut slots: BTreeMap<usize, ParticipantInput> = BTreeMap::new();

        for (key, value) in form {
            let Some(rest) = key.strip_prefix("canoe") else { continue };
            let Some((index, field)) = rest.split_once('_') else { continue };
            let Ok(slot) = index.parse::<usize>() else { continue };
            // Only the canonical spelling counts, so `canoe01_fname` cannot shadow `canoe1_fname`.
            if slot == 0 || slot.to_string() != index {
                continue;
            }

            let entry = slots.entry(slot).or_default();
            match field {
                "fname" => entry.first_name = Some(value.clone()),
                "lname" => entry.last_name = Some(value.clone()),
                _ => {}
            }
        }

        Self { slots }
    }

    pub fn get(&self, slot: usize) -> Option<&ParticipantInput> {
        self.slots.get(&slot)
    }
}

/// Parses the requested canoe count; anything but a positive integer is rejected.
pub fn parse_canoe_count(raw: &str) -> CoreResult<i64> {
    let count = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| CoreError::InvalidInput(format!("'{}' is not a valid number of canoes", raw.trim())))?;

    if count <= 0 {
        return Err(CoreError::InvalidInput(
            "At least one canoe must be booked".to_string(),
        ));
    }
    Ok(count)
}

/// Display name for one slot: trimmed first and last name joined by a space,
/// or a positional placeholder when both are blank.
pub fn display_name(slot: usize, input: Option<&ParticipantInput>) -> String {
    let first = input
        .and_then(|p| p.first_name.as_deref())
        .unwrap_or("")
        .trim();
    let last = input
        .and_then(|p| p.last_name.as_deref())
        .unwrap_or("")
        .trim();

    let full = format!("{} {}", first, last);
    let full = full.trim();
    if full.is_empty() {
        format!("Unnamed person #{}", slot)
    } else {
        full.to_string()
    }
}

/// One display name per slot in `1..=count`.
pub fn derive_names(count: usize, participants: &Participants) -> Vec<String> {
    (1..=count)
        .map(|slot| display_name(slot, participants.get(slot)))
        .collect()
}

/// Rejects any name that would not fit a confirmed booking row.
pub fn validate_names(names: &[String]) -> CoreResult<()> {
    for (i, name) in names.iter().enumerate() {
        if name.chars().count() > MAX_NAME_LEN {
            return Err(CoreError::InvalidInput(format!(
                "Name for canoe {} must be at most {} characters",
                i + 1,
                MAX_NAME_LEN
            )));
        }
    }
    Ok(())
}
