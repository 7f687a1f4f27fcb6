mod bonus_day;


pub use bonus_day::BonusDay;

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::shared::DomainError;

/// Maps instants onto bonus days.
///
/// A bonus day does not roll over at local midnight: the instant is shifted
/// into a fixed UTC offset, moved back by the cutover hours, and the calendar
/// date of the result is the day. With the deployed JST / 05:00 settings any
/// activity between 00:00 and 04:59 local still belongs to the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusCalendar {
    offset: FixedOffset,
    cutover_hours: u32,
}

impl BonusCalendar {
    pub const JST_OFFSET_HOURS: i32 = 9;
    pub const DEFAULT_CUTOVER_HOUR: u32 = 5;

    pub fn new(utc_offset_hours: i32, cutover_hours: u32) -> Result<Self, DomainError> {
        if cutover_hours >= 24 {
            return Err(DomainError::Validation(format!(
                "Cutover hour must be within 0..24, got {}",
                cutover_hours
            )));
        }

        if !(-12..=14).contains(&utc_offset_hours) {
            return Err(DomainError::Validation(format!(
                "UTC offset must be within -12..=14 hours, got {}",
                utc_offset_hours
            )));
        }

        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
            DomainError::Validation(format!("Invalid UTC offset: {}", utc_offset_hours))
        })?;

        Ok(Self {
            offset,
            cutover_hours,
        })
    }

    /// JST with the day rolling over at 05:00 local.
    pub fn jst() -> Self {
        Self::new(Self::JST_OFFSET_HOURS, Self::DEFAULT_CUTOVER_HOUR)
            .expect("JST calendar settings are in range")
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn cutover_hours(&self) -> u32 {
        self.cutover_hours
    }

    /// Bonus day containing `instant`.
    pub fn day_of(&self, instant: DateTime<Utc>) -> BonusDay {
        let local = instant.with_timezone(&self.offset);
        let shifted = local - Duration::hours(i64::from(self.cutover_hours));
        BonusDay::new(shifted.date_naive())
    }
}

impl Default for BonusCalendar {
    fn default() -> Self {
        Self::jst()
    }
}
