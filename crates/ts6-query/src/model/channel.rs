//! `channellist` record.

use crate::response::Record;

/// One channel as listed by the server, before any name parsing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[allow(missing_docs)] // field names mirror the wire keys
pub struct ChannelEntry {
    /// Channel id.
    pub cid: String,
    /// Parent channel id; `"0"` for top-level channels.
    pub pid: String,
    /// Id of the channel sorted above this one.
    pub channel_order: String,
    /// Raw channel name, including any spacer tag.
    pub name: String,
    pub topic: String,
    pub flag_permanent: String,
    pub flag_semi_permanent: String,
    pub flag_default: String,
    pub flag_password: String,
    pub flag_max_clients_unlimited: String,
    pub flag_max_family_clients_unlimited: String,
    pub max_clients: String,
    pub max_family_clients: String,
    pub needed_talk_power: String,
    pub codec: String,
    pub codec_quality: String,
    pub total_clients: String,
    pub icon_id: String,
    pub seconds_empty: String,
}

impl ChannelEntry {
    /// Read the known channel keys.
    pub fn from_record(record: &Record) -> Self {
        Self {
            cid: record.get_or_default("cid"),
            pid: record.get_or_default("pid"),
            channel_order: record.get_or_default("channel_order"),
            name: record.get_or_default("channel_name"),
            topic: record.get_or_default("channel_topic"),
            flag_permanent: record.get_or_default("channel_flag_permanent"),
            flag_semi_permanent: record.get_or_default("channel_flag_semi_permanent"),
            flag_default: record.get_or_default("channel_flag_default"),
            flag_password: record.get_or_default("channel_flag_password"),
            flag_max_clients_unlimited: record
                .get_or_default("channel_flag_maxclients_unlimited"),
            flag_max_family_clients_unlimited: record
                .get_or_default("channel_flag_maxfamilyclients_unlimited"),
            max_clients: record.get_or_default("channel_maxclients"),
            max_family_clients: record.get_or_default("channel_maxfamilyclients"),
            needed_talk_power: record.get_or_default("channel_needed_talk_power"),
            codec: record.get_or_default("channel_codec"),
            codec_quality: record.get_or_default("channel_codec_quality"),
            total_clients: record.get_or_default("total_clients"),
            icon_id: record.get_or_default("channel_icon_id"),
            seconds_empty: record.get_or_default("seconds_empty"),
        }
    }

    /// Whether this channel sits at the top of the tree.
    pub fn is_top_level(&self) -> bool {
        self.pid == "0"
    }
}
