pub mod actor;

pub use actor::{
    ActorId, ActorLocation, ActorProfile, CreatureTemplate, Exempt, Honors, Inventory, QuestLog,
    Reputation, SkillValue, Skills, Spellbook, Team, Vitals, Wallet,
};
