//! Who may mutate what.
//!
//! Recipes and saves answer to their own `user_id`. Ingredients and
//! instructions answer to the author of the recipe they belong to; their own
//! `user_id` is a creation record only. Comments may be removed by whoever
//! wrote them or by the author of the recipe they sit on.

use tracing::warn;

use crate::{
    error::AppError,
    recipes::repo_types::{Comment, Ingredient, Instruction, Recipe, Save},
};

#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Recipe(&'a Recipe),
    Save(&'a Save),
    Ingredient(&'a Ingredient, &'a Recipe),
    Instruction(&'a Instruction, &'a Recipe),
    Comment(&'a Comment, &'a Recipe),
}

impl Target<'_> {
    fn label(&self) -> &'static str {
        match self {
            Target::Recipe(_) => "recipe",
            Target::Save(_) => "save",
            Target::Ingredient(..) => "ingredient",
            Target::Instruction(..) => "instruction",
            Target::Comment(..) => "comment",
        }
    }

    fn id(&self) -> i64 {
        match self {
            Target::Recipe(r) => r.id,
            Target::Save(s) => s.id,
            Target::Ingredient(i, _) => i.id,
            Target::Instruction(i, _) => i.id,
            Target::Comment(c, _) => c.id,
        }
    }
}

/// Pure ownership predicate over user ids. A child paired with a recipe it
/// does not belong to is never authorized.
pub fn may_mutate(actor: i64, target: &Target<'_>) -> bool {
    match target {
        Target::Recipe(r) => r.user_id == actor,
        Target::Save(s) => s.user_id == actor,
        Target::Ingredient(i, r) => i.recipe_id == r.id && r.user_id == actor,
        Target::Instruction(i, r) => i.recipe_id == r.id && r.user_id == actor,
        Target::Comment(c, r) => c.recipe_id == r.id && (c.user_id == actor || r.user_id == actor),
    }
}

pub fn authorize(actor: i64, target: Target<'_>) -> Result<(), AppError> {
    if may_mutate(actor, &target) {
        return Ok(());
    }
    warn!(actor, kind = target.label(), id = target.id(), "ownership check failed");
    Err(AppError::forbidden(format!(
        "You do not have permission to modify this {}",
        target.label()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const ALICE: i64 = 1;
    const BOB: i64 = 2;

    fn recipe(id: i64, author: i64) -> Recipe {
        Recipe {
            id,
            name: "Shakshuka".into(),
            description: None,
            cuisine: "Maghrebi".into(),
            cook_time: "30 min".into(),
            servings: Some("2".into()),
            date_created: datetime!(2024-04-26 12:00 UTC),
            user_id: author,
        }
    }

    fn ingredient(recipe_id: i64, creator: i64) -> Ingredient {
        Ingredient {
            id: 10,
            name: "egg".into(),
            quantity: 4,
            unit: "whole".into(),
            recipe_id,
            user_id: creator,
        }
    }

    fn comment(recipe_id: i64, author: i64) -> Comment {
        Comment {
            id: 30,
            body: "lovely".into(),
            date_created: datetime!(2024-04-26 12:30 UTC),
            user_id: author,
            recipe_id,
        }
    }

    #[test]
    fn recipe_is_author_only() {
        let r = recipe(1, ALICE);
        assert!(may_mutate(ALICE, &Target::Recipe(&r)));
        assert!(!may_mutate(BOB, &Target::Recipe(&r)));
    }

    #[test]
    fn ingredient_ownership_goes_through_recipe() {
        let r = recipe(1, ALICE);
        let i = ingredient(1, ALICE);
        assert!(may_mutate(ALICE, &Target::Ingredient(&i, &r)));
        let err = authorize(BOB, Target::Ingredient(&i, &r)).unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[test]
    fn child_creator_field_grants_nothing() {
        // Bob's name is on the row, but the recipe is Alice's.
        let r = recipe(1, ALICE);
        let i = ingredient(1, BOB);
        assert!(!may_mutate(BOB, &Target::Ingredient(&i, &r)));
        assert!(may_mutate(ALICE, &Target::Ingredient(&i, &r)));
    }

    #[test]
    fn instruction_ownership_goes_through_recipe() {
        let r = recipe(1, ALICE);
        let step = Instruction {
            id: 20,
            step_number: 1,
            body: Some("crack the eggs".into()),
            recipe_id: 1,
            user_id: ALICE,
        };
        assert!(may_mutate(ALICE, &Target::Instruction(&step, &r)));
        assert!(!may_mutate(BOB, &Target::Instruction(&step, &r)));
    }

    #[test]
    fn mismatched_parent_is_denied() {
        let other = recipe(2, ALICE);
        let i = ingredient(1, ALICE);
        assert!(!may_mutate(ALICE, &Target::Ingredient(&i, &other)));
    }

    #[test]
    fn comment_removable_by_writer_or_recipe_author() {
        let r = recipe(1, ALICE);
        let c = comment(1, BOB);
        assert!(may_mutate(BOB, &Target::Comment(&c, &r)));
        assert!(may_mutate(ALICE, &Target::Comment(&c, &r)));
        assert!(!may_mutate(3, &Target::Comment(&c, &r)));
    }

    #[test]
    fn save_is_owner_only() {
        let s = Save {
            id: 40,
            recipe_id: 1,
            user_id: BOB,
        };
        assert!(may_mutate(BOB, &Target::Save(&s)));
        assert!(!may_mutate(ALICE, &Target::Save(&s)));
    }

    #[test]
    fn denial_message_names_the_kind() {
        let r = recipe(1, ALICE);
        let err = authorize(BOB, Target::Recipe(&r)).unwrap_err();
        assert_eq!(err.to_string(), "You do not have permission to modify this recipe");
    }
}
