//! Persisted collection structs.
//!
//! One struct per table, mirroring the post-migration schema. The root
//! [`GuildConfig`] record is transferred before every collection that
//! references a guild by foreign key.

use chrono::{DateTime, Utc};
use sqlx::query_builder::Separated;
use sqlx::Postgres;

use super::Entity;

/// Root per-guild configuration record.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildConfig {
    pub guild_id: i64,
    pub staff_role_id: Option<i64>,
    pub mute_role_id: Option<i64>,
    pub delete_message_on_command: bool,
    pub prefix: Option<String>,
}

impl Entity for GuildConfig {
    const TABLE: &'static str = "guild_configs";
    const COLUMNS: &'static [&'static str] = &[
        "guild_id",
        "staff_role_id",
        "mute_role_id",
        "delete_message_on_command",
        "prefix",
    ];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            guild_id: row.get(0)?,
            staff_role_id: row.get(1)?,
            mute_role_id: row.get(2)?,
            delete_message_on_command: row.get(3)?,
            prefix: row.get(4)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.guild_id)
            .push_bind(self.staff_role_id)
            .push_bind(self.mute_role_id)
            .push_bind(self.delete_message_on_command)
            .push_bind(self.prefix.clone());
    }
}

/// A user known to the bot, shared across guilds.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscordUser {
    pub user_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub is_bot_owner: bool,
}

impl Entity for DiscordUser {
    const TABLE: &'static str = "discord_users";
    const COLUMNS: &'static [&'static str] =
        &["user_id", "username", "avatar_url", "is_bot_owner"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            username: row.get(1)?,
            avatar_url: row.get(2)?,
            is_bot_owner: row.get(3)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.user_id)
            .push_bind(self.username.clone())
            .push_bind(self.avatar_url.clone())
            .push_bind(self.is_bot_owner);
    }
}

/// Away-from-keyboard marker with the message shown to pingers.
#[derive(Debug, Clone, PartialEq)]
pub struct Afk {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub message: String,
    pub set_at: DateTime<Utc>,
}

impl Entity for Afk {
    const TABLE: &'static str = "afk";
    const COLUMNS: &'static [&'static str] = &["id", "guild_id", "user_id", "message", "set_at"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            user_id: row.get(2)?,
            message: row.get(3)?,
            set_at: row.get(4)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.user_id)
            .push_bind(self.message.clone())
            .push_bind(self.set_at);
    }
}

/// A command scheduled to run on an interval in one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoCommand {
    pub id: i64,
    pub guild_id: i64,
    pub channel_id: i64,
    pub command_text: String,
    pub interval_secs: i64,
}

impl Entity for AutoCommand {
    const TABLE: &'static str = "auto_commands";
    const COLUMNS: &'static [&'static str] =
        &["id", "guild_id", "channel_id", "command_text", "interval_secs"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            channel_id: row.get(2)?,
            command_text: row.get(3)?,
            interval_secs: row.get(4)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.channel_id)
            .push_bind(self.command_text.clone())
            .push_bind(self.interval_secs);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BanTemplate {
    pub id: i64,
    pub guild_id: i64,
    pub text: String,
}

impl Entity for BanTemplate {
    const TABLE: &'static str = "ban_templates";
    const COLUMNS: &'static [&'static str] = &["id", "guild_id", "text"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            text: row.get(2)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.text.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandAlias {
    pub id: i64,
    pub guild_id: i64,
    pub trigger_text: String,
    pub mapping: String,
}

impl Entity for CommandAlias {
    const TABLE: &'static str = "command_aliases";
    const COLUMNS: &'static [&'static str] = &["id", "guild_id", "trigger_text", "mapping"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            trigger_text: row.get(2)?,
            mapping: row.get(3)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.trigger_text.clone())
            .push_bind(self.mapping.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Giveaway {
    pub id: i64,
    pub guild_id: i64,
    pub channel_id: i64,
    pub message_id: Option<i64>,
    pub prize: String,
    pub winners: i32,
    pub ends_at: DateTime<Utc>,
}

impl Entity for Giveaway {
    const TABLE: &'static str = "giveaways";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "guild_id",
        "channel_id",
        "message_id",
        "prize",
        "winners",
        "ends_at",
    ];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            channel_id: row.get(2)?,
            message_id: row.get(3)?,
            prize: row.get(4)?,
            winners: row.get(5)?,
            ends_at: row.get(6)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.channel_id)
            .push_bind(self.message_id)
            .push_bind(self.prize.clone())
            .push_bind(self.winners)
            .push_bind(self.ends_at);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiGreet {
    pub id: i64,
    pub guild_id: i64,
    pub channel_id: i64,
    pub message: String,
    pub delete_after_secs: Option<i64>,
}

impl Entity for MultiGreet {
    const TABLE: &'static str = "multi_greets";
    const COLUMNS: &'static [&'static str] =
        &["id", "guild_id", "channel_id", "message", "delete_after_secs"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            channel_id: row.get(2)?,
            message: row.get(3)?,
            delete_after_secs: row.get(4)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.channel_id)
            .push_bind(self.message.clone())
            .push_bind(self.delete_after_secs);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutedUser {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
}

impl Entity for MutedUser {
    const TABLE: &'static str = "muted_users";
    const COLUMNS: &'static [&'static str] = &["id", "guild_id", "user_id"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            user_id: row.get(2)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.user_id);
    }
}

/// A running poll. Votes reference it, so polls transfer first.
#[derive(Debug, Clone, PartialEq)]
pub struct Poll {
    pub id: i64,
    pub guild_id: i64,
    pub channel_id: i64,
    pub question: String,
}

impl Entity for Poll {
    const TABLE: &'static str = "polls";
    const COLUMNS: &'static [&'static str] = &["id", "guild_id", "channel_id", "question"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            channel_id: row.get(2)?,
            question: row.get(3)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.channel_id)
            .push_bind(self.question.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollVote {
    pub id: i64,
    pub poll_id: i64,
    pub user_id: i64,
    pub vote_index: i32,
}

impl Entity for PollVote {
    const TABLE: &'static str = "poll_votes";
    const COLUMNS: &'static [&'static str] = &["id", "poll_id", "user_id", "vote_index"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            poll_id: row.get(1)?,
            user_id: row.get(2)?,
            vote_index: row.get(3)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.poll_id)
            .push_bind(self.user_id)
            .push_bind(self.vote_index);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub id: i64,
    pub guild_id: i64,
    pub keyword: String,
    pub author_id: i64,
    pub text: String,
}

impl Entity for Quote {
    const TABLE: &'static str = "quotes";
    const COLUMNS: &'static [&'static str] = &["id", "guild_id", "keyword", "author_id", "text"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            keyword: row.get(2)?,
            author_id: row.get(3)?,
            text: row.get(4)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.keyword.clone())
            .push_bind(self.author_id)
            .push_bind(self.text.clone());
    }
}

/// A pending reminder. Not guild-scoped; reminders follow the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: i64,
    pub user_id: i64,
    pub channel_id: i64,
    pub message: String,
    pub due_at: DateTime<Utc>,
    pub is_private: bool,
}

impl Entity for Reminder {
    const TABLE: &'static str = "reminders";
    const COLUMNS: &'static [&'static str] =
        &["id", "user_id", "channel_id", "message", "due_at", "is_private"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            channel_id: row.get(2)?,
            message: row.get(3)?,
            due_at: row.get(4)?,
            is_private: row.get(5)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.user_id)
            .push_bind(self.channel_id)
            .push_bind(self.message.clone())
            .push_bind(self.due_at)
            .push_bind(self.is_private);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub id: i64,
    pub guild_id: i64,
    pub suggestion_number: i64,
    pub user_id: i64,
    pub message_id: Option<i64>,
    pub content: String,
}

impl Entity for Suggestion {
    const TABLE: &'static str = "suggestions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "guild_id",
        "suggestion_number",
        "user_id",
        "message_id",
        "content",
    ];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            suggestion_number: row.get(2)?,
            user_id: row.get(3)?,
            message_id: row.get(4)?,
            content: row.get(5)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.suggestion_number)
            .push_bind(self.user_id)
            .push_bind(self.message_id)
            .push_bind(self.content.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnbanTimer {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub unban_at: DateTime<Utc>,
}

impl Entity for UnbanTimer {
    const TABLE: &'static str = "unban_timers";
    const COLUMNS: &'static [&'static str] = &["id", "guild_id", "user_id", "unban_at"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            user_id: row.get(2)?,
            unban_at: row.get(3)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.user_id)
            .push_bind(self.unban_at);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnmuteTimer {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub unmute_at: DateTime<Utc>,
}

impl Entity for UnmuteTimer {
    const TABLE: &'static str = "unmute_timers";
    const COLUMNS: &'static [&'static str] = &["id", "guild_id", "user_id", "unmute_at"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            user_id: row.get(2)?,
            unmute_at: row.get(3)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.user_id)
            .push_bind(self.unmute_at);
    }
}

/// Per-user, per-guild XP tally. Deduplicated by the `(user_id, guild_id)`
/// pair rather than the surrogate id.
#[derive(Debug, Clone, PartialEq)]
pub struct UserXpStats {
    pub id: i64,
    pub user_id: i64,
    pub guild_id: i64,
    pub xp: i64,
    pub awarded_xp: i64,
    pub last_level_up: Option<DateTime<Utc>>,
}

impl Entity for UserXpStats {
    const TABLE: &'static str = "user_xp_stats";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "guild_id",
        "xp",
        "awarded_xp",
        "last_level_up",
    ];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            guild_id: row.get(2)?,
            xp: row.get(3)?,
            awarded_xp: row.get(4)?,
            last_level_up: row.get(5)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.user_id)
            .push_bind(self.guild_id)
            .push_bind(self.xp)
            .push_bind(self.awarded_xp)
            .push_bind(self.last_level_up);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub reason: Option<String>,
    pub moderator: String,
    pub forgiven: bool,
    pub warned_at: DateTime<Utc>,
}

impl Entity for Warning {
    const TABLE: &'static str = "warnings";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "guild_id",
        "user_id",
        "reason",
        "moderator",
        "forgiven",
        "warned_at",
    ];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            user_id: row.get(2)?,
            reason: row.get(3)?,
            moderator: row.get(4)?,
            forgiven: row.get(5)?,
            warned_at: row.get(6)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.user_id)
            .push_bind(self.reason.clone())
            .push_bind(self.moderator.clone())
            .push_bind(self.forgiven)
            .push_bind(self.warned_at);
    }
}

/// Escalation rule applied when a user reaches a warning count.
#[derive(Debug, Clone, PartialEq)]
pub struct WarningPunishment {
    pub id: i64,
    pub guild_id: i64,
    pub count: i32,
    pub punishment: i32,
    pub time_mins: Option<i32>,
}

impl Entity for WarningPunishment {
    const TABLE: &'static str = "warning_punishments";
    const COLUMNS: &'static [&'static str] =
        &["id", "guild_id", "count", "punishment", "time_mins"];

    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            guild_id: row.get(1)?,
            count: row.get(2)?,
            punishment: row.get(3)?,
            time_mins: row.get(4)?,
        })
    }

    fn bind(&self, values: &mut Separated<'_, '_, Postgres, &'static str>) {
        values
            .push_bind(self.id)
            .push_bind(self.guild_id)
            .push_bind(self.count)
            .push_bind(self.punishment)
            .push_bind(self.time_mins);
    }
}
