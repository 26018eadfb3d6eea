//! The acquisition gate: one synchronous filter over every item grant path.
//!
//! The engine asks before handing anyone an item, whether from a touch
//! pickup, the default spawn loadout, or its own buy menu. The gate
//! answers inline and mutates nothing: a redirected purchase only queues
//! deferred work and denies the engine's own grant.

use tracing::debug;

use crate::effect::Notice;
use crate::mode::ModeContext;
use crate::purchase;
use crate::session::ParticipantId;

/// How the engine came to offer the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMethod {
    /// Touch pickup or engine default loadout.
    Pickup,
    /// Engine buy-menu purchase.
    Purchase,
}

/// Whether the engine should proceed with its default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionVerdict {
    /// Let the engine grant the item.
    Allow,
    /// Block the grant entirely.
    Deny,
}

/// Filter one prospective item grant.
///
/// Check order: infected melee-only rule, global restriction, purchase
/// redirect. Unknown participants fall through to the engine default, which
/// leaves state untouched.
pub fn handle(
    ctx: &mut ModeContext,
    participant: ParticipantId,
    entity: &str,
    method: AcquisitionMethod,
) -> AcquisitionVerdict {
    let Some(session) = ctx.sessions.get(participant) else {
        debug!(participant = %participant, entity, "acquisition by unknown participant");
        return AcquisitionVerdict::Allow;
    };
    if session.is_infected() && entity != ctx.settings.melee_entity {
        debug!(participant = %participant, entity, "infected may only carry the melee weapon");
        return AcquisitionVerdict::Deny;
    }
    let weapon = ctx.catalog.weapon_by_entity(entity).cloned();
    if let Some(weapon) = &weapon {
        if weapon.restricted {
            if method == AcquisitionMethod::Purchase {
                ctx.effects.notice(
                    participant,
                    Notice::WeaponRestricted {
                        weapon: weapon.display_name.clone(),
                    },
                );
            }
            debug!(participant = %participant, weapon = %weapon.name, "restricted weapon blocked");
            return AcquisitionVerdict::Deny;
        }
    }
    if method == AcquisitionMethod::Purchase && ctx.settings.purchase_enabled {
        if let Some(weapon) = weapon {
            let _ = purchase::validate_and_execute(ctx, participant, &weapon, true);
            return AcquisitionVerdict::Deny;
        }
    }
    AcquisitionVerdict::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EngineEffect;
    use crate::test_fixtures::{join_defender, join_infected, sample_context};

    #[test]
    fn test_infected_keep_only_the_melee_weapon() {
        let mut ctx = sample_context();
        let p = join_infected(&mut ctx, "zed");

        assert_eq!(
            handle(&mut ctx, p, "weapon_ak47", AcquisitionMethod::Pickup),
            AcquisitionVerdict::Deny
        );
        assert_eq!(
            handle(&mut ctx, p, "weapon_knife", AcquisitionMethod::Pickup),
            AcquisitionVerdict::Allow
        );
    }

    #[test]
    fn test_restricted_weapon_denied_with_notice_on_purchase() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");

        assert_eq!(
            handle(&mut ctx, p, "weapon_awp", AcquisitionMethod::Pickup),
            AcquisitionVerdict::Deny
        );
        assert!(ctx.effects.is_empty());

        assert_eq!(
            handle(&mut ctx, p, "weapon_awp", AcquisitionMethod::Purchase),
            AcquisitionVerdict::Deny
        );
        assert!(matches!(
            ctx.effects.drain().as_slice(),
            [EngineEffect::Notice {
                notice: Notice::WeaponRestricted { .. },
                ..
            }]
        ));
    }

    #[test]
    fn test_purchase_redirects_into_the_pipeline() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");

        let verdict = handle(&mut ctx, p, "weapon_ak47", AcquisitionMethod::Purchase);
        assert_eq!(verdict, AcquisitionVerdict::Deny);
        // The engine grant is denied; ours is queued for the next update.
        assert_eq!(ctx.queue.len(), 1);
    }

    #[test]
    fn test_purchase_falls_through_when_purchasing_disabled() {
        let mut ctx = sample_context();
        ctx.settings.purchase_enabled = false;
        let p = join_defender(&mut ctx, "ada");

        assert_eq!(
            handle(&mut ctx, p, "weapon_ak47", AcquisitionMethod::Purchase),
            AcquisitionVerdict::Allow
        );
        assert!(ctx.queue.is_empty());
    }

    #[test]
    fn test_uncataloged_entity_allowed() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");
        assert_eq!(
            handle(&mut ctx, p, "weapon_c4", AcquisitionMethod::Pickup),
            AcquisitionVerdict::Allow
        );
    }

    #[test]
    fn test_unknown_participant_falls_through() {
        let mut ctx = sample_context();
        assert_eq!(
            handle(
                &mut ctx,
                ParticipantId(99),
                "weapon_ak47",
                AcquisitionMethod::Pickup
            ),
            AcquisitionVerdict::Allow
        );
    }
}
