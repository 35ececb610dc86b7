use crate::rules::criterion_type::CriterionType;

/// Skill tiers are configured in steps of this many skill points.
pub const SKILL_TIER_STEP: u64 = 75;
/// Fall distance that counts as surviving a long fall, regardless of tree amount.
pub const SAFE_FALL_THRESHOLD: u64 = 65;

/// Whether a criterion counter satisfies a leaf's required amount.
///
/// `counter` is `None` when the actor has no record for the criterion.
pub fn criterion_complete(criterion_type: CriterionType, counter: Option<u64>, required: u64) -> bool {
    let Some(counter) = counter else {
        return false;
    };
    match criterion_type {
        CriterionType::ON_LOGIN => true,
        CriterionType::COMPLETE_ACHIEVEMENT
        | CriterionType::COMPLETE_QUEST
        | CriterionType::LEARN_SPELL
        | CriterionType::EXPLORE_AREA
        | CriterionType::EQUIP_ITEM
        | CriterionType::EQUIP_EPIC_ITEM
        | CriterionType::USE_GAMEOBJECT
        | CriterionType::BE_SPELL_TARGET
        | CriterionType::BE_SPELL_TARGET2
        | CriterionType::FISH_IN_GAMEOBJECT => counter >= 1,
        CriterionType::LEARN_SKILL_LEVEL => counter >= required.saturating_mul(SKILL_TIER_STEP),
        CriterionType::FALL_WITHOUT_DYING => counter >= SAFE_FALL_THRESHOLD,
        CriterionType::COMPLETE_DAILY_QUEST_DAILY => required != 0 && counter >= required,
        _ => counter >= required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rule_compares_against_amount() {
        assert!(criterion_complete(CriterionType::KILL_CREATURE, Some(5), 5));
        assert!(!criterion_complete(CriterionType::KILL_CREATURE, Some(4), 5));
        assert!(!criterion_complete(CriterionType::KILL_CREATURE, None, 0));
    }

    #[test]
    fn fixed_threshold_families() {
        assert!(criterion_complete(CriterionType::COMPLETE_QUEST, Some(1), 50));
        assert!(!criterion_complete(CriterionType::COMPLETE_QUEST, Some(0), 0));
        assert!(criterion_complete(CriterionType::LEARN_SKILL_LEVEL, Some(150), 2));
        assert!(!criterion_complete(CriterionType::LEARN_SKILL_LEVEL, Some(149), 2));
        assert!(criterion_complete(CriterionType::FALL_WITHOUT_DYING, Some(65), 1000));
        assert!(!criterion_complete(CriterionType::COMPLETE_DAILY_QUEST_DAILY, Some(9), 0));
        assert!(criterion_complete(CriterionType::ON_LOGIN, Some(0), 10));
        assert!(!criterion_complete(CriterionType::ON_LOGIN, None, 0));
    }
}
