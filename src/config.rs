use crate::engine::policy::{AttendancePolicy, CheckWindow};
use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Attendance windows (local wall-clock)
    pub check_in_open: NaiveTime,
    pub check_in_close: NaiveTime,
    pub check_out_open: NaiveTime,
    pub check_out_close: NaiveTime,
    pub late_after: NaiveTime,

    // Projection
    pub page_size: u32,
    pub show_all_cap: u32,

    // Rate limiting
    pub rate_action_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

fn env_time(key: &str, default: &str) -> NaiveTime {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M"))
        .unwrap_or_else(|_| panic!("{} must be HH:MM or HH:MM:SS, got {:?}", key, raw))
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            check_in_open: env_time("CHECK_IN_OPEN", "07:00:00"),
            check_in_close: env_time("CHECK_IN_CLOSE", "08:00:00"),
            check_out_open: env_time("CHECK_OUT_OPEN", "14:30:00"),
            check_out_close: env_time("CHECK_OUT_CLOSE", "14:40:00"),
            late_after: env_time("LATE_AFTER", "08:00:00"),

            page_size: env::var("PAGE_SIZE")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap(),
            show_all_cap: env::var("SHOW_ALL_CAP")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap(),

            rate_action_per_min: env::var("RATE_ACTION_PER_MIN")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }

    /// Windows and lateness threshold handed to the engine at construction.
    pub fn attendance_policy(&self) -> AttendancePolicy {
        AttendancePolicy {
            check_in: CheckWindow::new(self.check_in_open, self.check_in_close),
            check_out: CheckWindow::new(self.check_out_open, self.check_out_close),
            late_after: self.late_after,
            page_size: self.page_size,
            show_all_cap: self.show_all_cap,
        }
    }
}
