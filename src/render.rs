//! Plain-text views of a log: cascade trees, tick listings, summaries.
//!
//! Read-only; nothing here mutates the log.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write;

use eventure_core::Event;
use eventure_log::{CascadeReport, EventLog};
use serde_json::Value;

fn describe(event: &Event) -> String {
    let mut line = format!("{} {} (tick {})", event.id(), event.event_type(), event.tick());
    if !event.data().is_empty() {
        let _ = write!(line, " {}", Value::Object(event.data().clone()));
    }
    line
}

/// Tree view of the cascade rooted at `root_id`, children in cascade order.
///
/// `None` when `root_id` is not in the log.
pub fn render_cascade(log: &EventLog, root_id: &str) -> Option<String> {
    render_cascade_report(&log.cascade_report(root_id), root_id)
}

/// [`render_cascade`] from a cascade the caller has already walked.
pub fn render_cascade_report(report: &CascadeReport, root_id: &str) -> Option<String> {
    let events = &report.events;
    let root = events.iter().find(|e| e.id() == root_id)?;

    let mut children: HashMap<&str, Vec<&Event>> = HashMap::new();
    for event in events.iter().filter(|e| e.id() != root_id) {
        if let Some(parent) = event.parent_id() {
            children.entry(parent).or_default().push(event);
        }
    }

    let mut out = describe(root);
    out.push('\n');
    let mut visited = HashSet::from([root.id()]);
    write_branch(&mut out, &children, root.id(), "", &mut visited);
    Some(out)
}

fn write_branch<'a>(
    out: &mut String,
    children: &HashMap<&str, Vec<&'a Event>>,
    parent: &str,
    prefix: &str,
    visited: &mut HashSet<&'a str>,
) {
    let kids: Vec<&'a Event> = children
        .get(parent)
        .map(|kids| {
            kids.iter()
                .copied()
                .filter(|k| !visited.contains(k.id()))
                .collect()
        })
        .unwrap_or_default();

    for (i, &kid) in kids.iter().enumerate() {
        if !visited.insert(kid.id()) {
            continue;
        }
        let last = i + 1 == kids.len();
        let (branch, indent) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        let _ = writeln!(out, "{prefix}{branch}{}", describe(kid));
        write_branch(out, children, kid.id(), &format!("{prefix}{indent}"), visited);
    }
}

/// Every event at `tick`, one per line, with its parent when it has one.
pub fn render_tick(log: &EventLog, tick: u64) -> String {
    let events = log.get_events_at_tick(tick);
    let mut out = format!("tick {tick}: {} event(s)\n", events.len());
    for event in &events {
        let _ = write!(out, "  {}", describe(event));
        if let Some(parent) = event.parent_id() {
            let _ = write!(out, " <- {parent}");
        }
        out.push('\n');
    }
    out
}

/// Event count, tick span, and per-type counts.
pub fn render_summary(log: &EventLog) -> String {
    let events = log.events();
    let mut out = format!("{} event(s)\n", events.len());

    let ticks = events.iter().map(Event::tick);
    if let (Some(first), Some(last)) = (ticks.clone().min(), ticks.max()) {
        let _ = writeln!(out, "ticks {first}..={last}");
    }

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for event in &events {
        *by_type.entry(event.event_type()).or_default() += 1;
    }
    for (event_type, count) in by_type {
        let _ = writeln!(out, "  {event_type}: {count}");
    }

    let roots = events.iter().filter(|e| e.is_root()).count();
    let _ = writeln!(out, "{roots} root event(s)");
    out
}
