use super::{ControlEvent, ControlPanel};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

/// Keyboard collaborator backed by a stdin line-reader thread.
///
/// Commands: `q` quit, `b` recapture background, `t` toggle tuning mode,
/// `set <control> <value>` to move a tuning slider. The pipeline itself
/// stays single-threaded; this thread only feeds the event channel and
/// the shared slider table.
pub struct TerminalControls {
    events: Receiver<ControlEvent>,
    sliders: Arc<Mutex<HashMap<&'static str, i32>>>,
}

impl TerminalControls {
    pub fn spawn() -> Self {
        let (tx, rx) = unbounded();
        let sliders = Arc::new(Mutex::new(default_sliders()));
        let shared = Arc::clone(&sliders);
        std::thread::spawn(move || read_commands(tx, shared));
        Self {
            events: rx,
            sliders,
        }
    }

    /// Event channel handle for the frame loop to poll.
    pub fn events(&self) -> Receiver<ControlEvent> {
        self.events.clone()
    }
}

impl ControlPanel for TerminalControls {
    fn control_value(&self, name: &str) -> i32 {
        self.sliders.lock().get(name).copied().unwrap_or(0)
    }
}

/// Trackbar defaults from the tuning UI this replaces.
fn default_sliders() -> HashMap<&'static str, i32> {
    HashMap::from([("h1", 0), ("s1", 120), ("v1", 70), ("h2", 10)])
}

fn read_commands(tx: Sender<ControlEvent>, sliders: Arc<Mutex<HashMap<&'static str, i32>>>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let mut words = line.split_whitespace();

        let event = match words.next() {
            Some("q") => Some(ControlEvent::Quit),
            Some("b") => Some(ControlEvent::RecaptureBackground),
            Some("t") => Some(ControlEvent::ToggleTuning),
            Some("set") => {
                apply_set(&sliders, words.next(), words.next());
                None
            }
            Some(other) => {
                tracing::warn!("unknown command '{other}' (q, b, t, set <name> <value>)");
                None
            }
            None => None,
        };

        if let Some(event) = event {
            let quitting = event == ControlEvent::Quit;
            if tx.send(event).is_err() || quitting {
                break;
            }
        }
    }
}

fn apply_set(
    sliders: &Mutex<HashMap<&'static str, i32>>,
    name: Option<&str>,
    value: Option<&str>,
) {
    let parsed = value.and_then(|v| v.parse::<i32>().ok());
    match (name, parsed) {
        (Some(name), Some(value)) => match sliders.lock().get_mut(name) {
            Some(slot) => *slot = value,
            None => tracing::warn!("unknown control '{name}' (h1, s1, v1, h2)"),
        },
        _ => tracing::warn!("usage: set <h1|s1|v1|h2> <value>"),
    }
}
