use std::collections::VecDeque;

/// Bounded ring buffer of drag/drop decisions, for copy-pasting into bug reports.
#[derive(Debug, Default)]
pub(crate) struct DebugLog {
    lines: VecDeque<String>,
    serial: u64,
}

impl DebugLog {
    pub(crate) fn push(&mut self, capacity: usize, message: String) {
        let cap = capacity.clamp(1, 10_000);
        while self.lines.len() >= cap {
            self.lines.pop_front();
        }
        self.serial = self.serial.wrapping_add(1);
        log::trace!("{message}");
        self.lines.push_back(format!("[{}] {}", self.serial, message));
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }

    pub(crate) fn text(&self) -> String {
        self.lines.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_buffer_drops_oldest() {
        let mut log = DebugLog::default();
        for i in 0..5 {
            log.push(3, format!("line {i}"));
        }
        assert_eq!(log.len(), 3);
        let text = log.text();
        assert!(!text.contains("line 1"), "{text}");
        assert!(text.ends_with("[5] line 4"), "{text}");
    }
}
