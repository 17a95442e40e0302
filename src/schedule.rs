//! Pickup windows sellers publish for handing orders out.

use chrono::{NaiveDate, NaiveTime};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::{geo::Coordinate, sellers::SellerKey};

new_key_type! {
    /// Unique key for a published pickup window.
    pub struct WindowKey;
}

/// Errors from scheduling operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// The window's start time is not strictly before its end time.
    #[error("window must start before it ends: {start} to {end}")]
    StartNotBeforeEnd {
        /// Start time as given.
        start: NaiveTime,

        /// End time as given.
        end: NaiveTime,
    },

    /// The window's location is outside the valid degree ranges.
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate {
        /// Latitude as given.
        latitude: f64,

        /// Longitude as given.
        longitude: f64,
    },
}

/// A pickup window a seller wants to publish.
///
/// Windows run within a single day: the start time must fall strictly
/// before the end time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDraft {
    /// Day the window falls on.
    pub date: NaiveDate,

    /// When the seller starts handing orders out.
    pub start: NaiveTime,

    /// When the seller stops.
    pub end: NaiveTime,

    /// Where to collect.
    pub location: Coordinate,

    /// Human-readable name for the spot.
    pub location_name: String,
}

/// A published pickup window.
#[derive(Debug, Clone, PartialEq)]
pub struct PickupWindow {
    key: WindowKey,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    location: Coordinate,
    location_name: String,
}

impl PickupWindow {
    /// The window's key in its book.
    #[must_use]
    pub fn key(&self) -> WindowKey {
        self.key
    }

    /// Day the window falls on.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// When the seller starts handing orders out.
    #[must_use]
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// When the seller stops.
    #[must_use]
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Where to collect.
    #[must_use]
    pub fn location(&self) -> Coordinate {
        self.location
    }

    /// Human-readable name for the spot.
    #[must_use]
    pub fn location_name(&self) -> &str {
        &self.location_name
    }
}

/// Every seller's published pickup windows.
///
/// The book does not check sellers against a directory; a seller key is
/// just the shelf their windows sit on.
#[derive(Debug, Default)]
pub struct AvailabilityBook {
    window_keys: SlotMap<WindowKey, ()>,
    windows: FxHashMap<SellerKey, Vec<PickupWindow>>,
}

impl AvailabilityBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a window for a seller.
    ///
    /// # Errors
    ///
    /// Returns an error if the start time is not strictly before the end
    /// time, or if the location is outside the valid degree ranges.
    pub fn add_window(
        &mut self,
        seller: SellerKey,
        draft: WindowDraft,
    ) -> Result<WindowKey, ScheduleError> {
        if draft.start >= draft.end {
            return Err(ScheduleError::StartNotBeforeEnd {
                start: draft.start,
                end: draft.end,
            });
        }

        if !draft.location.is_valid() {
            return Err(ScheduleError::InvalidCoordinate {
                latitude: draft.location.latitude,
                longitude: draft.location.longitude,
            });
        }

        let key = self.window_keys.insert(());

        self.windows.entry(seller).or_default().push(PickupWindow {
            key,
            date: draft.date,
            start: draft.start,
            end: draft.end,
            location: draft.location,
            location_name: draft.location_name,
        });

        Ok(key)
    }

    /// Take a window down. Returns the window, or `None` if the seller had
    /// no window under that key.
    pub fn remove_window(&mut self, seller: SellerKey, key: WindowKey) -> Option<PickupWindow> {
        let windows = self.windows.get_mut(&seller)?;
        let index = windows.iter().position(|window| window.key == key)?;
        let removed = windows.remove(index);

        self.window_keys.remove(key);

        if windows.is_empty() {
            self.windows.remove(&seller);
        }

        Some(removed)
    }

    /// A seller's windows, in the order they were published.
    #[must_use]
    pub fn windows_for(&self, seller: SellerKey) -> &[PickupWindow] {
        self.windows.get(&seller).map_or(&[], Vec::as_slice)
    }

    /// Number of windows published across all sellers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.window_keys.len()
    }

    /// Whether no windows are published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window_keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::sellers::SellerDirectory;

    use super::*;

    fn day() -> TestResult<NaiveDate> {
        Ok(NaiveDate::from_ymd_opt(2025, 6, 2).ok_or("bad market day")?)
    }

    fn at(hour: u32) -> TestResult<NaiveTime> {
        Ok(NaiveTime::from_hms_opt(hour, 0, 0).ok_or("bad hour")?)
    }

    fn market_window(start: u32, end: u32) -> TestResult<WindowDraft> {
        Ok(WindowDraft {
            date: day()?,
            start: at(start)?,
            end: at(end)?,
            location: Coordinate::new(59.437, 24.754),
            location_name: "Balti Jaama Turg".to_string(),
        })
    }

    #[test]
    fn windows_list_in_publish_order() -> TestResult {
        let mut directory = SellerDirectory::new();
        let maria = directory.register("Maria's Garden").key();
        let mut book = AvailabilityBook::new();

        book.add_window(maria, market_window(10, 12)?)?;
        book.add_window(maria, market_window(16, 18)?)?;

        let starts: Vec<_> = book
            .windows_for(maria)
            .iter()
            .map(PickupWindow::start)
            .collect();

        assert_eq!(starts, [at(10)?, at(16)?]);
        assert_eq!(book.len(), 2);

        Ok(())
    }

    #[test]
    fn backwards_window_is_rejected() -> TestResult {
        let mut book = AvailabilityBook::new();

        let backwards = book.add_window(SellerKey::default(), market_window(18, 16)?);
        let empty = book.add_window(SellerKey::default(), market_window(12, 12)?);

        assert!(matches!(
            backwards,
            Err(ScheduleError::StartNotBeforeEnd { .. })
        ));
        assert!(matches!(empty, Err(ScheduleError::StartNotBeforeEnd { .. })));
        assert!(book.is_empty());

        Ok(())
    }

    #[test]
    fn off_range_location_is_rejected() -> TestResult {
        let mut book = AvailabilityBook::new();
        let mut draft = market_window(10, 12)?;
        draft.location = Coordinate::new(59.437, 200.0);

        let result = book.add_window(SellerKey::default(), draft);

        assert!(matches!(
            result,
            Err(ScheduleError::InvalidCoordinate { .. })
        ));

        Ok(())
    }

    #[test]
    fn remove_is_scoped_to_the_seller() -> TestResult {
        let mut directory = SellerDirectory::new();
        let maria = directory.register("Maria's Garden").key();
        let jaan = directory.register("Jaan's Bakery").key();
        let mut book = AvailabilityBook::new();

        let window = book.add_window(maria, market_window(10, 12)?)?;

        assert!(book.remove_window(jaan, window).is_none());
        assert_eq!(book.windows_for(maria).len(), 1);

        assert!(book.remove_window(maria, window).is_some());
        assert!(book.remove_window(maria, window).is_none());
        assert!(book.windows_for(maria).is_empty());

        Ok(())
    }

    #[test]
    fn sellers_keep_separate_schedules() -> TestResult {
        let mut directory = SellerDirectory::new();
        let maria = directory.register("Maria's Garden").key();
        let jaan = directory.register("Jaan's Bakery").key();
        let mut book = AvailabilityBook::new();

        book.add_window(maria, market_window(10, 12)?)?;
        book.add_window(jaan, market_window(14, 15)?)?;

        assert_eq!(book.windows_for(maria).len(), 1);
        assert_eq!(book.windows_for(jaan).len(), 1);
        assert_eq!(book.windows_for(SellerKey::default()).len(), 0);

        Ok(())
    }

    #[test]
    fn window_carries_its_draft_fields() -> TestResult {
        let mut book = AvailabilityBook::new();
        let seller = SellerKey::default();

        let key = book.add_window(seller, market_window(10, 12)?)?;
        let window = book.windows_for(seller).first().ok_or("expected a published window")?;

        assert_eq!(window.key(), key);
        assert_eq!(window.date(), day()?);
        assert_eq!(window.start(), at(10)?);
        assert_eq!(window.end(), at(12)?);
        assert_eq!(window.location(), Coordinate::new(59.437, 24.754));
        assert_eq!(window.location_name(), "Balti Jaama Turg");

        Ok(())
    }
}
