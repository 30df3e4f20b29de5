use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::value_objects::ScanToken;

/// What a single keystroke carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A single visible character.
    Char(char),
    /// The scanner's end-of-record key.
    Enter,
    /// Modifiers, navigation keys and everything else.
    Other,
}

/// Where the keystroke landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget {
    /// A text input, text area or other control accepting direct edits.
    /// These strokes are always manual entry and are never intercepted.
    EditableControl,
    /// A focus-bearing element that does not accept text.
    Passive,
}

#[derive(Debug, Clone, Copy)]
pub struct KeyStroke {
    pub input: KeyInput,
    pub target: KeyTarget,
    pub at: Instant,
}

type TokenCallback = Box<dyn Fn(&ScanToken) + Send + Sync>;

/// Tells hardware-scanner bursts apart from a human typing on the same
/// shared field.
///
/// A scanner emits a whole barcode faster than the quiet interval; a human
/// does not reliably do so. Characters accumulate in a transient buffer and
/// Enter flushes it; any quiet-interval gap discards what came before.
/// Purely synchronous keystroke accounting; the caller supplies the instant
/// of each event, so no timer is needed.
pub struct ScanDisambiguator {
    quiet_interval: Duration,
    buffer: String,
    last_char_at: Option<Instant>,
    callback: Option<TokenCallback>,
}

impl ScanDisambiguator {
    pub fn new(quiet_interval: Duration) -> Self {
        Self {
            quiet_interval,
            buffer: String::new(),
            last_char_at: None,
            callback: None,
        }
    }

    /// Register the single emission hook. Keyboard bursts, camera decodes
    /// and manual submit buttons all funnel through it.
    pub fn on_scan_token_resolved<F>(&mut self, callback: F)
    where
        F: Fn(&ScanToken) + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    /// Feed one keystroke. Returns the completed token when this stroke
    /// finished a scan, `None` otherwise.
    pub fn handle_key(&mut self, stroke: KeyStroke) -> Option<ScanToken> {
        if stroke.target == KeyTarget::EditableControl {
            return None;
        }

        self.discard_if_stale(stroke.at);

        match stroke.input {
            KeyInput::Char(ch) if !ch.is_control() => {
                self.buffer.push(ch);
                self.last_char_at = Some(stroke.at);
                None
            }
            KeyInput::Enter => {
                let raw = std::mem::take(&mut self.buffer);
                self.last_char_at = None;
                self.resolve_token(&raw)
            }
            _ => None,
        }
    }

    /// Shared ingestion path for completed tokens, whatever their source.
    pub fn resolve_token(&self, raw: &str) -> Option<ScanToken> {
        let token = ScanToken::new(raw.to_string()).ok()?;
        debug!(token = %token, "Scan token resolved");
        if let Some(callback) = &self.callback {
            callback(&token);
        }
        Some(token)
    }

    fn discard_if_stale(&mut self, now: Instant) {
        if let Some(last) = self.last_char_at {
            if now.duration_since(last) > self.quiet_interval {
                self.buffer.clear();
                self.last_char_at = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const QUIET: Duration = Duration::from_millis(300);

    fn strokes(text: &str, start: Instant, gap: Duration) -> Vec<KeyStroke> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| KeyStroke {
                input: KeyInput::Char(ch),
                target: KeyTarget::Passive,
                at: start + gap * u32::try_from(i).unwrap(),
            })
            .collect()
    }

    fn enter_at(at: Instant) -> KeyStroke {
        KeyStroke {
            input: KeyInput::Enter,
            target: KeyTarget::Passive,
            at,
        }
    }

    #[test]
    fn test_rapid_burst_emits_single_token() {
        let mut disambiguator = ScanDisambiguator::new(QUIET);
        let start = Instant::now();

        let mut emitted = None;
        for stroke in strokes("GYM-0042-ABC", start, Duration::from_millis(10)) {
            assert!(disambiguator.handle_key(stroke).is_none());
            emitted = Some(stroke.at);
        }
        let token = disambiguator
            .handle_key(enter_at(emitted.unwrap() + Duration::from_millis(10)))
            .unwrap();

        assert_eq!(token.as_str(), "GYM-0042-ABC");
        assert_eq!(token.len(), 12);
    }

    #[test]
    fn test_slow_typing_yields_no_token() {
        let mut disambiguator = ScanDisambiguator::new(QUIET);
        let start = Instant::now();

        let mut last = start;
        for stroke in strokes("GYM-0042", start, Duration::from_millis(400)) {
            assert!(disambiguator.handle_key(stroke).is_none());
            last = stroke.at;
        }
        let result = disambiguator.handle_key(enter_at(last + Duration::from_millis(400)));
        assert!(result.is_none());
    }

    #[test]
    fn test_editable_targets_are_never_intercepted() {
        let mut disambiguator = ScanDisambiguator::new(QUIET);
        let start = Instant::now();

        for (i, ch) in "GYM-0042".chars().enumerate() {
            let stroke = KeyStroke {
                input: KeyInput::Char(ch),
                target: KeyTarget::EditableControl,
                at: start + Duration::from_millis(10) * u32::try_from(i).unwrap(),
            };
            assert!(disambiguator.handle_key(stroke).is_none());
        }
        let result = disambiguator.handle_key(KeyStroke {
            input: KeyInput::Enter,
            target: KeyTarget::EditableControl,
            at: start + Duration::from_millis(100),
        });
        assert!(result.is_none());

        // Nothing leaked into the passive-target buffer either.
        let result = disambiguator.handle_key(enter_at(start + Duration::from_millis(110)));
        assert!(result.is_none());
    }

    #[test]
    fn test_enter_with_empty_buffer_is_noop() {
        let mut disambiguator = ScanDisambiguator::new(QUIET);
        assert!(disambiguator.handle_key(enter_at(Instant::now())).is_none());
    }

    #[test]
    fn test_repeated_enter_emits_at_most_once() {
        let mut disambiguator = ScanDisambiguator::new(QUIET);
        let start = Instant::now();

        for stroke in strokes("ABC", start, Duration::from_millis(10)) {
            disambiguator.handle_key(stroke);
        }
        let first = disambiguator.handle_key(enter_at(start + Duration::from_millis(40)));
        let second = disambiguator.handle_key(enter_at(start + Duration::from_millis(50)));

        assert_eq!(first.unwrap().as_str(), "ABC");
        assert!(second.is_none());
    }

    #[test]
    fn test_stale_buffer_is_discarded_before_new_burst() {
        let mut disambiguator = ScanDisambiguator::new(QUIET);
        let start = Instant::now();

        for stroke in strokes("OLD", start, Duration::from_millis(10)) {
            disambiguator.handle_key(stroke);
        }

        // A fresh burst long after the quiet interval replaces the remnant.
        let resumed = start + Duration::from_millis(1000);
        for stroke in strokes("NEW-42", resumed, Duration::from_millis(10)) {
            disambiguator.handle_key(stroke);
        }
        let token = disambiguator
            .handle_key(enter_at(resumed + Duration::from_millis(60)))
            .unwrap();

        assert_eq!(token.as_str(), "NEW-42");
    }

    #[test]
    fn test_modifier_keys_do_not_break_a_burst() {
        let mut disambiguator = ScanDisambiguator::new(QUIET);
        let start = Instant::now();

        disambiguator.handle_key(KeyStroke {
            input: KeyInput::Char('A'),
            target: KeyTarget::Passive,
            at: start,
        });
        disambiguator.handle_key(KeyStroke {
            input: KeyInput::Other,
            target: KeyTarget::Passive,
            at: start + Duration::from_millis(5),
        });
        disambiguator.handle_key(KeyStroke {
            input: KeyInput::Char('B'),
            target: KeyTarget::Passive,
            at: start + Duration::from_millis(10),
        });

        let token = disambiguator
            .handle_key(enter_at(start + Duration::from_millis(20)))
            .unwrap();
        assert_eq!(token.as_str(), "AB");
    }

    #[test]
    fn test_callback_receives_tokens_from_all_sources() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut disambiguator = ScanDisambiguator::new(QUIET);
        disambiguator.on_scan_token_resolved(move |token| {
            sink.lock().unwrap().push(token.as_str().to_string());
        });

        let start = Instant::now();
        for stroke in strokes("GYM-7", start, Duration::from_millis(10)) {
            disambiguator.handle_key(stroke);
        }
        disambiguator.handle_key(enter_at(start + Duration::from_millis(60)));

        // Camera decode / manual submit converge on the same path.
        disambiguator.resolve_token("  GYM-8  ");

        assert_eq!(*seen.lock().unwrap(), vec!["GYM-7", "GYM-8"]);
    }

    #[test]
    fn test_whitespace_only_buffer_is_not_emitted() {
        let mut disambiguator = ScanDisambiguator::new(QUIET);
        let start = Instant::now();

        for stroke in strokes("   ", start, Duration::from_millis(10)) {
            disambiguator.handle_key(stroke);
        }
        assert!(disambiguator
            .handle_key(enter_at(start + Duration::from_millis(40)))
            .is_none());
    }
}
