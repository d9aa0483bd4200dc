//! The presentation side: what the animator drives and what poll results are
//! written into.

use crate::iracing::{ DriverSnapshot, Update };

/// Transition states a slot can be marked with. At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Entering,
    Exiting,
}

pub trait Slot {
    /// Hidden baseline: fully transparent and out of the layout flow.
    fn hide(self: &mut Self);

    /// Replaces the current marker. `None` clears it.
    fn set_marker(self: &mut Self, marker: Option<Marker>);
}

pub trait StateUpdater {
    fn update_state(self: &mut Self, update: &Update);
}

pub trait Overlay: Slot + StateUpdater { }

impl<T: Slot + ?Sized> Slot for Box<T> {
    fn hide(&mut self) {
        (**self).hide()
    }

    fn set_marker(&mut self, marker: Option<Marker>) {
        (**self).set_marker(marker)
    }
}

impl<T: StateUpdater + ?Sized> StateUpdater for Box<T> {
    fn update_state(&mut self, update: &Update) {
        (**self).update_state(update)
    }
}

impl<T: Overlay + ?Sized> Overlay for Box<T> { }

/// A line of text filled from the latest driver snapshot.
///
/// The template uses `{field}` placeholders named after the snapshot's wire
/// fields, e.g. `"{driver_name} #{driver_number}"`. Rendering goes to the log.
#[derive(Debug, Clone)]
pub struct TextSlot {
    name: String,
    template: String,
    text: String,
    visible: bool,
    stale: bool,
    marker: Option<Marker>,
}

impl TextSlot {
    pub fn new(name: &str, template: &str) -> TextSlot {
        TextSlot {
            name: name.to_string(),
            template: template.to_string(),
            text: String::new(),
            visible: false,
            stale: true,
            marker: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True until the first snapshot arrives, and again while the server is
    /// unreachable.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn marker(&self) -> Option<Marker> {
        self.marker
    }
}

impl Slot for TextSlot {
    fn hide(&mut self) {
        if self.visible {
            debug!("[{}] hidden", self.name);
        }
        self.visible = false;
    }

    fn set_marker(&mut self, marker: Option<Marker>) {
        self.marker = marker;
        match marker {
            Some(Marker::Entering) => {
                self.visible = true;
                if self.stale {
                    info!("[{}] {} (stale)", self.name, self.text);
                } else {
                    info!("[{}] {}", self.name, self.text);
                }
            },
            Some(Marker::Exiting) => debug!("[{}] exiting", self.name),
            None => {},
        }
    }
}

impl StateUpdater for TextSlot {
    fn update_state(&mut self, update: &Update) {
        match update {
            Update::Driver(snapshot) => {
                self.text = render(&self.template, snapshot);
                self.stale = false;
            },
            Update::Offline(_) => self.stale = true,
        }
    }
}

impl Overlay for TextSlot { }

/// Fills `{field}` placeholders. Unknown fields and unbalanced braces are
/// left as written.
pub fn render(template: &str, snapshot: &DriverSnapshot) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        output.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        match after_open.find('}') {
            Some(close) => {
                let name = &after_open[..close];
                match snapshot.field(name) {
                    Some(value) => output.push_str(&value),
                    None => {
                        output.push('{');
                        output.push_str(name);
                        output.push('}');
                    },
                }
                rest = &after_open[close + 1..];
            },
            None => {
                output.push_str(&rest[open..]);
                rest = "";
            },
        }
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iracing::test_snapshot;

    #[test]
    fn render_fills_known_fields() {
        let snapshot = test_snapshot("Max Driver");
        assert_eq!(
            render("{driver_name} #{driver_number} | {driver_license} | {driver_irating} iR", &snapshot),
            "Max Driver #42 | A 4.50 | 2750 iR"
        );
        assert_eq!(render("Lap {driver_laps}/{total_laps}", &snapshot), "Lap 12/30");
    }

    #[test]
    fn render_keeps_unknown_and_unbalanced_placeholders() {
        let snapshot = test_snapshot("Max Driver");
        assert_eq!(render("{fuel} left", &snapshot), "{fuel} left");
        assert_eq!(render("Inc {driver_incidents} {oops", &snapshot), "Inc 2 {oops");
    }

    #[test]
    fn text_slot_tracks_markers_and_visibility() {
        let mut slot = TextSlot::new("driver", "{driver_name}");
        assert!(!slot.is_visible());

        slot.set_marker(Some(Marker::Entering));
        assert!(slot.is_visible());
        assert_eq!(slot.marker(), Some(Marker::Entering));

        slot.set_marker(Some(Marker::Exiting));
        assert!(slot.is_visible());

        slot.set_marker(None);
        slot.hide();
        assert!(!slot.is_visible());
        assert_eq!(slot.marker(), None);
    }

    #[test]
    fn text_slot_follows_updates() {
        let mut slot = TextSlot::new("incidents", "{driver_incidents}x / team {team_incidents}x");
        assert!(slot.is_stale());
        slot.update_state(&Update::Driver(test_snapshot("Max Driver")));
        assert_eq!(slot.text(), "2x / team 6x");
        assert!(!slot.is_stale());

        slot.update_state(&Update::Offline("HTTP 503: Not connected to iRacing".to_string()));
        assert!(slot.is_stale());
        assert_eq!(slot.text(), "2x / team 6x");
    }
}
