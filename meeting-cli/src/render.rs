//! Colored terminal rendering for meeting-core types.

use meeting_core::attendee::Attendee;
use meeting_core::busy::{BusyPeriod, FreeBusyType};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for FreeBusyType {
    fn render(&self) -> String {
        let label = format!("{:<13}", self.label());
        match self {
            FreeBusyType::Busy => label.red().to_string(),
            FreeBusyType::Tentative => label.yellow().to_string(),
            FreeBusyType::OutOfOffice => label.magenta().to_string(),
            FreeBusyType::Free => label.green().to_string(),
        }
    }
}

impl Render for BusyPeriod {
    fn render(&self) -> String {
        let mut line = format!("{} {} → {}", self.busy_type.render(), self.start, self.end);

        if let Some(xfb) = &self.xfb {
            let details: Vec<&str> = [xfb.summary.as_deref(), xfb.location.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !details.is_empty() {
                line.push_str(&format!("  {}", details.join(" @ ").dimmed()));
            }
        }

        line
    }
}

impl Render for Attendee {
    fn render(&self) -> String {
        let address = self.address_without_mailto();
        if self.cn().is_empty() {
            format!("👤 {}", address.bold())
        } else {
            format!("👤 {} {}", self.cn().bold(), format!("<{}>", address).dimmed())
        }
    }
}
