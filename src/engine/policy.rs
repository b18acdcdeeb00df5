use chrono::NaiveTime;

/// Daily clock-time interval during which an action is permitted.
/// Inclusive of `open`, exclusive of `close`.
#[derive(Debug, Clone, Copy)]
pub struct CheckWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl CheckWindow {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.open && time < self.close
    }
}

/// Injected at engine construction; the defaults mirror the school's
/// fixed schedule.
#[derive(Debug, Clone, Copy)]
pub struct AttendancePolicy {
    pub check_in: CheckWindow,
    pub check_out: CheckWindow,
    /// Lateness threshold. Convention: inclusive on the late side, so a
    /// check-in at the threshold instant sharp counts as late.
    pub late_after: NaiveTime,
    pub page_size: u32,
    pub show_all_cap: u32,
}

impl AttendancePolicy {
    pub fn is_late(&self, time: NaiveTime) -> bool {
        time >= self.late_after
    }
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("valid time");
        AttendancePolicy {
            check_in: CheckWindow::new(t(7, 0), t(8, 0)),
            check_out: CheckWindow::new(t(14, 30), t(14, 40)),
            late_after: t(8, 0),
            page_size: 5,
            show_all_cap: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn check_in_window_is_half_open() {
        let policy = AttendancePolicy::default();
        assert!(policy.check_in.contains(hms(7, 0, 0)), "open bound is inclusive");
        assert!(policy.check_in.contains(hms(7, 59, 59)));
        assert!(!policy.check_in.contains(hms(8, 0, 0)), "close bound is exclusive");
        assert!(!policy.check_in.contains(hms(6, 59, 59)));
        assert!(!policy.check_in.contains(hms(12, 0, 0)));
    }

    #[test]
    fn check_out_window_is_half_open() {
        let policy = AttendancePolicy::default();
        assert!(policy.check_out.contains(hms(14, 30, 0)));
        assert!(policy.check_out.contains(hms(14, 39, 59)));
        assert!(!policy.check_out.contains(hms(14, 40, 0)));
        assert!(!policy.check_out.contains(hms(14, 29, 59)));
    }

    #[test]
    fn lateness_is_inclusive_at_the_threshold() {
        let policy = AttendancePolicy::default();
        assert!(!policy.is_late(hms(7, 59, 59)));
        assert!(policy.is_late(hms(8, 0, 0)), "threshold sharp counts as late");
        assert!(policy.is_late(hms(8, 0, 1)));
    }
}
