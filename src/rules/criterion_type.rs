use serde::{Deserialize, Serialize};

/// Event type a criterion listens for.
///
/// This is a plain numeric id rather than a closed enum: whether a type is
/// recognized is decided by the progress rule registry, so catalog data may
/// carry types this build has no rule for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriterionType(pub u16);

impl CriterionType {
    pub const KILL_CREATURE: Self = Self(0);
    pub const WIN_BATTLEGROUND: Self = Self(1);
    pub const REACH_LEVEL: Self = Self(5);
    pub const REACH_SKILL_LEVEL: Self = Self(7);
    pub const COMPLETE_ACHIEVEMENT: Self = Self(8);
    pub const COMPLETE_QUEST_COUNT: Self = Self(9);
    pub const COMPLETE_DAILY_QUEST_DAILY: Self = Self(10);
    pub const COMPLETE_QUESTS_IN_ZONE: Self = Self(11);
    pub const DAMAGE_DONE: Self = Self(13);
    pub const COMPLETE_DAILY_QUEST: Self = Self(14);
    pub const COMPLETE_BATTLEGROUND: Self = Self(15);
    pub const DEATH_AT_MAP: Self = Self(16);
    pub const DEATH: Self = Self(17);
    pub const DEATH_IN_DUNGEON: Self = Self(18);
    pub const COMPLETE_RAID: Self = Self(19);
    pub const KILLED_BY_CREATURE: Self = Self(20);
    pub const KILLED_BY_PLAYER: Self = Self(23);
    pub const FALL_WITHOUT_DYING: Self = Self(24);
    pub const DEATHS_FROM: Self = Self(26);
    pub const COMPLETE_QUEST: Self = Self(27);
    pub const BE_SPELL_TARGET: Self = Self(28);
    pub const CAST_SPELL: Self = Self(29);
    pub const BG_OBJECTIVE_CAPTURE: Self = Self(30);
    pub const HONORABLE_KILL_AT_AREA: Self = Self(31);
    pub const WIN_ARENA: Self = Self(32);
    pub const PLAY_ARENA: Self = Self(33);
    pub const LEARN_SPELL: Self = Self(34);
    pub const HONORABLE_KILL: Self = Self(35);
    pub const OWN_ITEM: Self = Self(36);
    pub const WIN_RATED_ARENA: Self = Self(37);
    pub const HIGHEST_TEAM_RATING: Self = Self(38);
    pub const HIGHEST_PERSONAL_RATING: Self = Self(39);
    pub const LEARN_SKILL_LEVEL: Self = Self(40);
    pub const USE_ITEM: Self = Self(41);
    pub const LOOT_ITEM: Self = Self(42);
    pub const EXPLORE_AREA: Self = Self(43);
    pub const OWN_RANK: Self = Self(44);
    pub const BUY_BANK_SLOT: Self = Self(45);
    pub const GAIN_REPUTATION: Self = Self(46);
    pub const GAIN_EXALTED_REPUTATION: Self = Self(47);
    pub const VISIT_BARBER_SHOP: Self = Self(48);
    pub const EQUIP_EPIC_ITEM: Self = Self(49);
    pub const ROLL_NEED_ON_LOOT: Self = Self(50);
    pub const ROLL_GREED_ON_LOOT: Self = Self(51);
    pub const HK_CLASS: Self = Self(52);
    pub const HK_RACE: Self = Self(53);
    pub const DO_EMOTE: Self = Self(54);
    pub const HEALING_DONE: Self = Self(55);
    pub const GET_KILLING_BLOWS: Self = Self(56);
    pub const EQUIP_ITEM: Self = Self(57);
    pub const MONEY_FROM_VENDORS: Self = Self(62);
    pub const GOLD_SPENT_FOR_TALENTS: Self = Self(63);
    pub const NUMBER_OF_TALENT_RESETS: Self = Self(64);
    pub const GOLD_SPENT_AT_BARBER: Self = Self(65);
    pub const GOLD_SPENT_FOR_MAIL: Self = Self(66);
    pub const LOOT_MONEY: Self = Self(67);
    pub const USE_GAMEOBJECT: Self = Self(68);
    pub const BE_SPELL_TARGET2: Self = Self(69);
    pub const SPECIAL_PVP_KILL: Self = Self(70);
    pub const FISH_IN_GAMEOBJECT: Self = Self(72);
    pub const ON_LOGIN: Self = Self(73);
    pub const LEARN_SKILLLINE_SPELLS: Self = Self(75);
    pub const WIN_DUEL: Self = Self(76);
    pub const LOSE_DUEL: Self = Self(77);
    pub const KILL_CREATURE_TYPE: Self = Self(78);
    pub const GOLD_EARNED_BY_AUCTIONS: Self = Self(80);
    pub const CREATE_AUCTION: Self = Self(82);
    pub const HIGHEST_AUCTION_BID: Self = Self(83);
    pub const WON_AUCTIONS: Self = Self(84);
    pub const HIGHEST_AUCTION_SOLD: Self = Self(85);
    pub const HIGHEST_GOLD_VALUE_OWNED: Self = Self(86);
    pub const GAIN_REVERED_REPUTATION: Self = Self(87);
    pub const GAIN_HONORED_REPUTATION: Self = Self(88);
    pub const KNOWN_FACTIONS: Self = Self(89);
    pub const LOOT_EPIC_ITEM: Self = Self(90);
    pub const RECEIVE_EPIC_ITEM: Self = Self(91);
    pub const ROLL_NEED: Self = Self(93);
    pub const ROLL_GREED: Self = Self(94);
    pub const HIGHEST_HEALTH: Self = Self(95);
    pub const HIGHEST_POWER: Self = Self(96);
    pub const HIGHEST_STAT: Self = Self(97);
    pub const HIGHEST_SPELLPOWER: Self = Self(98);
    pub const HIGHEST_ARMOR: Self = Self(99);
    pub const HIGHEST_RATING: Self = Self(100);
    pub const HIGHEST_HIT_DEALT: Self = Self(101);
    pub const HIGHEST_HIT_RECEIVED: Self = Self(102);
    pub const TOTAL_DAMAGE_RECEIVED: Self = Self(103);
    pub const HIGHEST_HEAL_CAST: Self = Self(104);
    pub const TOTAL_HEALING_RECEIVED: Self = Self(105);
    pub const HIGHEST_HEALING_RECEIVED: Self = Self(106);
    pub const QUEST_ABANDONED: Self = Self(107);
    pub const FLIGHT_PATHS_TAKEN: Self = Self(108);
    pub const LOOT_TYPE: Self = Self(109);
    pub const CAST_SPELL2: Self = Self(110);
    pub const LEARN_SKILL_LINE: Self = Self(112);
    pub const EARN_HONORABLE_KILL: Self = Self(113);
    pub const ACCEPTED_SUMMONINGS: Self = Self(114);
    pub const EARN_ACHIEVEMENT_POINTS: Self = Self(115);
    pub const USE_LFD_TO_GROUP_WITH_PLAYERS: Self = Self(119);
    pub const SPENT_GOLD_GUILD_REPAIRS: Self = Self(124);
    pub const REACH_GUILD_LEVEL: Self = Self(125);
    pub const CRAFT_ITEMS_GUILD: Self = Self(126);
    pub const CATCH_FROM_POOL: Self = Self(127);
    pub const BUY_GUILD_BANK_SLOTS: Self = Self(128);
    pub const EARN_GUILD_ACHIEVEMENT_POINTS: Self = Self(129);
    pub const WIN_RATED_BATTLEGROUND: Self = Self(130);
    pub const REACH_BG_RATING: Self = Self(132);
    pub const BUY_GUILD_TABARD: Self = Self(133);
    pub const COMPLETE_QUESTS_GUILD: Self = Self(134);
    pub const HONORABLE_KILLS_GUILD: Self = Self(135);
    pub const KILL_CREATURE_TYPE_GUILD: Self = Self(136);
}

impl std::fmt::Display for CriterionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Which tracker owns a criterion's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriterionScope {
    Individual,
    Account,
    Group,
    Scenario,
    QuestObjective,
}

impl Default for CriterionScope {
    fn default() -> Self {
        CriterionScope::Individual
    }
}

/// Event that starts the countdown of a timed criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerStartEvent {
    WorldEvent,
    AcceptQuest,
    SpellCaster,
    SpellTarget,
    KillCreature,
    UseItem,
    EarnAchievement,
}

/// Event that wipes a criterion's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailEvent {
    Death,
    LeaveBattleground,
    LeaveInstance,
    LeaveGroup,
}

#[derive(Debug)]
pub struct ParseKeywordError {
    pub value: String,
}

impl std::fmt::Display for ParseKeywordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown keyword: {}", self.value)
    }
}

impl std::error::Error for ParseKeywordError {}

impl std::str::FromStr for TimerStartEvent {
    type Err = ParseKeywordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WORLD_EVENT" => Ok(TimerStartEvent::WorldEvent),
            "ACCEPT_QUEST" => Ok(TimerStartEvent::AcceptQuest),
            "SPELL_CASTER" => Ok(TimerStartEvent::SpellCaster),
            "SPELL_TARGET" => Ok(TimerStartEvent::SpellTarget),
            "KILL_CREATURE" => Ok(TimerStartEvent::KillCreature),
            "USE_ITEM" => Ok(TimerStartEvent::UseItem),
            "EARN_ACHIEVEMENT" => Ok(TimerStartEvent::EarnAchievement),
            _ => Err(ParseKeywordError {
                value: s.to_string(),
            }),
        }
    }
}

impl std::str::FromStr for FailEvent {
    type Err = ParseKeywordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEATH" => Ok(FailEvent::Death),
            "LEAVE_BATTLEGROUND" => Ok(FailEvent::LeaveBattleground),
            "LEAVE_INSTANCE" => Ok(FailEvent::LeaveInstance),
            "LEAVE_GROUP" => Ok(FailEvent::LeaveGroup),
            _ => Err(ParseKeywordError {
                value: s.to_string(),
            }),
        }
    }
}
