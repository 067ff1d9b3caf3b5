//! Decoded buffer header fields

use serde::{Deserialize, Serialize};

/// Number of 32-bit fields in a buffer header.
pub const HEADER_FIELD_COUNT: usize = 12;

/// Field names in on-wire order.
pub const HEADER_FIELD_NAMES: [&str; HEADER_FIELD_COUNT] = [
    "linked_list",
    "frame_num",
    "buffer_count",
    "frame_buffer_count",
    "write_buffer_count",
    "dropped_buffer_count",
    "timestamp",
    "write_timestamp",
    "pixel_count",
    "battery_voltage_raw",
    "input_voltage_raw",
    "unix_time",
];

/// Largest valid `buffer_count` value.
pub const MAX_BUFFER_COUNT: u32 = 7;

/// Metadata carried by every buffer, in on-wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeaderFields {
    pub linked_list: u32,
    pub frame_num: u32,
    pub buffer_count: u32,
    pub frame_buffer_count: u32,
    pub write_buffer_count: u32,
    pub dropped_buffer_count: u32,
    pub timestamp: u32,
    pub write_timestamp: u32,
    pub pixel_count: u32,
    pub battery_voltage_raw: u32,
    pub input_voltage_raw: u32,
    pub unix_time: u32,
}

impl HeaderFields {
    /// Build header fields from words in on-wire order.
    pub fn from_words(words: [u32; HEADER_FIELD_COUNT]) -> Self {
        let [
            linked_list,
            frame_num,
            buffer_count,
            frame_buffer_count,
            write_buffer_count,
            dropped_buffer_count,
            timestamp,
            write_timestamp,
            pixel_count,
            battery_voltage_raw,
            input_voltage_raw,
            unix_time,
        ] = words;

        Self {
            linked_list,
            frame_num,
            buffer_count,
            frame_buffer_count,
            write_buffer_count,
            dropped_buffer_count,
            timestamp,
            write_timestamp,
            pixel_count,
            battery_voltage_raw,
            input_voltage_raw,
            unix_time,
        }
    }

    /// Fields as words in on-wire order.
    pub fn to_words(&self) -> [u32; HEADER_FIELD_COUNT] {
        [
            self.linked_list,
            self.frame_num,
            self.buffer_count,
            self.frame_buffer_count,
            self.write_buffer_count,
            self.dropped_buffer_count,
            self.timestamp,
            self.write_timestamp,
            self.pixel_count,
            self.battery_voltage_raw,
            self.input_voltage_raw,
            self.unix_time,
        ]
    }

    /// Look up a field by its wire name.
    pub fn get(&self, name: &str) -> Option<u32> {
        HEADER_FIELD_NAMES.iter().position(|field| *field == name).map(|i| self.to_words()[i])
    }

    /// Whether `buffer_count` lies in `0..=MAX_BUFFER_COUNT`.
    pub fn buffer_count_in_range(&self) -> bool {
        self.buffer_count <= MAX_BUFFER_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_map_positionally() {
        let words: [u32; HEADER_FIELD_COUNT] = std::array::from_fn(|i| i as u32 * 10);
        let header = HeaderFields::from_words(words);

        assert_eq!(header.linked_list, 0);
        assert_eq!(header.frame_num, 10);
        assert_eq!(header.unix_time, 110);
        assert_eq!(header.to_words(), words);
        assert_eq!(header.get("pixel_count"), Some(80));
        assert_eq!(header.get("no_such_field"), None);
    }

    #[test]
    fn buffer_count_range() {
        let mut header = HeaderFields { buffer_count: 7, ..Default::default() };
        assert!(header.buffer_count_in_range());
        header.buffer_count = 8;
        assert!(!header.buffer_count_in_range());
    }
}
