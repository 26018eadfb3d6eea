//! Purchase validation and the deferred grant pipeline.
//!
//! Validation is pure and ordered; a passing purchase queues a
//! [`ScheduledTask::GrantPurchase`] and the grant itself (give, count,
//! notify, deduct) runs at the next safe mutation point. Rejections push
//! their participant notice right away and surface the reason to callers.

use tracing::{debug, info, warn};

use crate::catalog::{WeaponDefinition, WeaponSlot};
use crate::effect::{EngineEffect, Notice};
use crate::error::ModeError;
use crate::mode::ModeContext;
use crate::round::RoundState;
use crate::schedule::ScheduledTask;
use crate::session::{ParticipantId, ParticipantSession};
use crate::settings::ModeSettings;

/// Armor value granted by an armor-slot purchase.
pub const KEVLAR_ARMOR: i32 = 100;

/// Why a purchase failed validation, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseRejection {
    /// Purchasing is switched off.
    Disabled,
    /// The buyer is dead.
    NotAlive,
    /// The buyer is infected.
    Infected,
    /// The buyer is outside every buy zone.
    OutsideBuyZone,
    /// The weapon is globally restricted.
    Restricted,
    /// The buyer cannot cover the price.
    InsufficientFunds,
    /// The per-round purchase cap is exhausted.
    CapReached,
}

impl std::fmt::Display for PurchaseRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            PurchaseRejection::Disabled => "purchasing disabled",
            PurchaseRejection::NotAlive => "buyer not alive",
            PurchaseRejection::Infected => "buyer infected",
            PurchaseRejection::OutsideBuyZone => "outside buy zone",
            PurchaseRejection::Restricted => "weapon restricted",
            PurchaseRejection::InsufficientFunds => "insufficient funds",
            PurchaseRejection::CapReached => "purchase cap reached",
        };
        write!(f, "{reason}")
    }
}

impl std::error::Error for PurchaseRejection {}

/// Run every purchase precondition in order against a session snapshot.
///
/// `deduct` selects paid purchases; free grants (the once-per-round rebuy)
/// skip the funds check but still honor every other rule.
pub fn validate(
    settings: &ModeSettings,
    round: &RoundState,
    participant: ParticipantId,
    session: &ParticipantSession,
    weapon: &WeaponDefinition,
    deduct: bool,
) -> Result<(), PurchaseRejection> {
    if !settings.purchase_enabled {
        return Err(PurchaseRejection::Disabled);
    }
    if !session.alive {
        return Err(PurchaseRejection::NotAlive);
    }
    if session.is_infected() {
        return Err(PurchaseRejection::Infected);
    }
    if settings.buy_zone_only && !session.in_buy_zone {
        return Err(PurchaseRejection::OutsideBuyZone);
    }
    if weapon.restricted {
        return Err(PurchaseRejection::Restricted);
    }
    if deduct && session.balance < weapon.price {
        return Err(PurchaseRejection::InsufficientFunds);
    }
    if weapon.purchase_cap > 0
        && round.purchase_count(participant, &weapon.name) >= weapon.purchase_cap
    {
        return Err(PurchaseRejection::CapReached);
    }
    Ok(())
}

fn rejection_notice(rejection: PurchaseRejection, weapon: &WeaponDefinition) -> Notice {
    match rejection {
        PurchaseRejection::Disabled => Notice::PurchasingDisabled,
        PurchaseRejection::NotAlive => Notice::MustBeAlive,
        PurchaseRejection::Infected => Notice::MustBeDefender,
        PurchaseRejection::OutsideBuyZone => Notice::MustBeInBuyZone,
        PurchaseRejection::Restricted => Notice::WeaponRestricted {
            weapon: weapon.display_name.clone(),
        },
        PurchaseRejection::InsufficientFunds => Notice::InsufficientFunds {
            price: weapon.price,
        },
        PurchaseRejection::CapReached => Notice::PurchaseCapReached {
            weapon: weapon.display_name.clone(),
            cap: weapon.purchase_cap,
        },
    }
}

/// Validate a purchase and queue the deferred grant on success.
///
/// A singleton-slot weapon already held is dropped immediately so the
/// grant lands in a free slot; grenades stack and drop nothing. Rejections
/// push their notice and return the reason.
pub fn validate_and_execute(
    ctx: &mut ModeContext,
    participant: ParticipantId,
    weapon: &WeaponDefinition,
    deduct: bool,
) -> crate::error::Result<()> {
    let Some(session) = ctx.sessions.get(participant) else {
        debug!(participant = %participant, "purchase for unknown participant");
        return Err(ModeError::ParticipantMissing(participant));
    };
    if let Err(rejection) = validate(
        &ctx.settings,
        &ctx.round,
        participant,
        session,
        weapon,
        deduct,
    ) {
        debug!(
            participant = %participant,
            weapon = %weapon.name,
            %rejection,
            "purchase rejected"
        );
        ctx.effects
            .notice(participant, rejection_notice(rejection, weapon));
        return Err(ModeError::PurchaseRejected(rejection));
    }
    if weapon.slot.is_singleton() && weapon.slot != WeaponSlot::Armor {
        let displaced = ctx
            .sessions
            .get_mut(participant)
            .and_then(|s| s.held.drop_slot(weapon.slot));
        if let Some(entity) = displaced {
            ctx.effects.push(EngineEffect::DropItem { participant, entity });
        }
    }
    ctx.queue.defer(ScheduledTask::GrantPurchase {
        participant,
        weapon: weapon.name.clone(),
        deduct,
    });
    debug!(participant = %participant, weapon = %weapon.name, "purchase queued");
    Ok(())
}

/// Executes a deferred grant: give the item, count it, notify, deduct.
///
/// Every precondition that can change in the window is rechecked:
/// disconnects and deaths skip the grant (and the deduction with it).
pub(crate) fn run_grant(
    ctx: &mut ModeContext,
    participant: ParticipantId,
    weapon_name: &str,
    deduct: bool,
) {
    let Some(weapon) = ctx.catalog.weapon(weapon_name).cloned() else {
        warn!(weapon = %weapon_name, "grant task references a weapon no longer in the catalog");
        return;
    };
    let Some(session) = ctx.sessions.get_mut(participant) else {
        debug!(participant = %participant, "grant task target gone");
        return;
    };
    if !session.alive {
        debug!(participant = %participant, "grant skipped, participant died");
        return;
    }
    if weapon.slot == WeaponSlot::Armor {
        session.armor = KEVLAR_ARMOR;
        ctx.effects.push(EngineEffect::SetArmor {
            participant,
            armor: KEVLAR_ARMOR,
            helmet: session.helmet,
        });
    } else {
        if let Some(displaced) = session.held.give(weapon.slot, weapon.entity.clone()) {
            if displaced != weapon.entity {
                ctx.effects.push(EngineEffect::DropItem {
                    participant,
                    entity: displaced,
                });
            }
        }
        ctx.effects.push(EngineEffect::GiveItem {
            participant,
            entity: weapon.entity.clone(),
        });
    }
    let count = ctx.round.record_purchase(participant, &weapon.name);
    let notice = if weapon.purchase_cap > 0 {
        Notice::PurchasedCapped {
            weapon: weapon.display_name.clone(),
            remaining: weapon.purchase_cap.saturating_sub(count),
        }
    } else {
        Notice::Purchased {
            weapon: weapon.display_name.clone(),
        }
    };
    ctx.effects.notice(participant, notice);
    if deduct {
        session.balance = (session.balance - weapon.price).max(0);
        ctx.effects.push(EngineEffect::SetBalance {
            participant,
            balance: session.balance,
        });
    }
    info!(participant = %participant, weapon = %weapon.name, deduct, "purchase granted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::advance;
    use crate::test_fixtures::{join_defender, join_infected, sample_context};

    fn weapon(ctx: &ModeContext, name: &str) -> WeaponDefinition {
        ctx.catalog.weapon(name).cloned().unwrap()
    }

    #[test]
    fn test_checks_run_in_order() {
        let mut ctx = sample_context();
        ctx.settings.buy_zone_only = true;
        let p = join_defender(&mut ctx, "ada");
        let ak = weapon(&ctx, "rifle_ak");

        let session = ctx.sessions.get_mut(p).unwrap();
        session.alive = false;
        session.in_buy_zone = false;
        session.balance = 0;

        // Dead outranks zone and funds.
        let session = ctx.sessions.get(p).unwrap();
        assert_eq!(
            validate(&ctx.settings, &ctx.round, p, session, &ak, true),
            Err(PurchaseRejection::NotAlive)
        );

        ctx.sessions.get_mut(p).unwrap().alive = true;
        let session = ctx.sessions.get(p).unwrap();
        assert_eq!(
            validate(&ctx.settings, &ctx.round, p, session, &ak, true),
            Err(PurchaseRejection::OutsideBuyZone)
        );

        ctx.sessions.get_mut(p).unwrap().in_buy_zone = true;
        let session = ctx.sessions.get(p).unwrap();
        assert_eq!(
            validate(&ctx.settings, &ctx.round, p, session, &ak, true),
            Err(PurchaseRejection::InsufficientFunds)
        );
    }

    #[test]
    fn test_infected_cannot_buy() {
        let mut ctx = sample_context();
        let p = join_infected(&mut ctx, "zed");
        let ak = weapon(&ctx, "rifle_ak");
        let session = ctx.sessions.get(p).unwrap();
        assert_eq!(
            validate(&ctx.settings, &ctx.round, p, session, &ak, true),
            Err(PurchaseRejection::Infected)
        );
    }

    #[test]
    fn test_free_purchase_skips_funds_only() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");
        ctx.sessions.get_mut(p).unwrap().balance = 0;
        let ak = weapon(&ctx, "rifle_ak");
        let awp = weapon(&ctx, "rifle_awp");

        let session = ctx.sessions.get(p).unwrap();
        assert_eq!(
            validate(&ctx.settings, &ctx.round, p, session, &ak, false),
            Ok(())
        );
        // Restriction still binds on free grants.
        assert_eq!(
            validate(&ctx.settings, &ctx.round, p, session, &awp, false),
            Err(PurchaseRejection::Restricted)
        );
    }

    #[test]
    fn test_grant_gives_counts_notifies_deducts() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");
        let ak = weapon(&ctx, "rifle_ak");

        validate_and_execute(&mut ctx, p, &ak, true).unwrap();
        // Nothing happens until the safe point.
        assert_eq!(ctx.sessions.get(p).unwrap().balance, 10_000);
        assert!(ctx.effects.is_empty());

        advance(&mut ctx, 1);
        let effects = ctx.effects.drain();
        assert!(effects.iter().any(|e| matches!(
            e,
            EngineEffect::GiveItem { entity, .. } if entity == "weapon_ak47"
        )));
        assert!(effects.iter().any(|e| matches!(
            e,
            EngineEffect::SetBalance { balance: 7_500, .. }
        )));
        let session = ctx.sessions.get(p).unwrap();
        assert_eq!(session.balance, 7_500);
        assert_eq!(session.held.in_slot(WeaponSlot::Primary), Some("weapon_ak47"));
        assert_eq!(ctx.round.purchase_count(p, "rifle_ak"), 1);
    }

    #[test]
    fn test_same_slot_weapon_dropped_before_grant() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");
        ctx.sessions
            .get_mut(p)
            .unwrap()
            .held
            .give(WeaponSlot::Primary, "weapon_m4a1");
        let ak = weapon(&ctx, "rifle_ak");

        validate_and_execute(&mut ctx, p, &ak, true).unwrap();
        // The old primary drops right away, ahead of the deferred grant.
        assert!(matches!(
            ctx.effects.drain().as_slice(),
            [EngineEffect::DropItem { entity, .. }] if entity == "weapon_m4a1"
        ));

        advance(&mut ctx, 1);
        assert_eq!(
            ctx.sessions.get(p).unwrap().held.in_slot(WeaponSlot::Primary),
            Some("weapon_ak47")
        );
    }

    #[test]
    fn test_cap_counts_only_granted_purchases() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");
        let he = weapon(&ctx, "grenade_he");

        validate_and_execute(&mut ctx, p, &he, true).unwrap();
        // Queued but not granted: a second buy in the same window passes
        // validation too.
        validate_and_execute(&mut ctx, p, &he, true).unwrap();

        advance(&mut ctx, 1);
        assert_eq!(ctx.round.purchase_count(p, "grenade_he"), 2);

        // Now the cap (1) is exhausted.
        let err = validate_and_execute(&mut ctx, p, &he, true).unwrap_err();
        assert!(matches!(
            err,
            ModeError::PurchaseRejected(PurchaseRejection::CapReached)
        ));
    }

    #[test]
    fn test_capped_rifle_buys_once_then_rejects_without_charge() {
        let mut ctx = sample_context();
        ctx.catalog.register_weapon(
            WeaponDefinition::new("rifle_lone", "Lone Rifle", "weapon_lone", WeaponSlot::Primary, 2500)
                .with_cap(1),
        );
        let p = join_defender(&mut ctx, "ada");
        ctx.sessions.get_mut(p).unwrap().balance = 4000;
        let rifle = weapon(&ctx, "rifle_lone");

        validate_and_execute(&mut ctx, p, &rifle, true).unwrap();
        advance(&mut ctx, 1);
        assert_eq!(ctx.sessions.get(p).unwrap().balance, 1500);

        let err = validate_and_execute(&mut ctx, p, &rifle, true).unwrap_err();
        assert!(matches!(
            err,
            ModeError::PurchaseRejected(PurchaseRejection::CapReached)
        ));
        assert_eq!(ctx.sessions.get(p).unwrap().balance, 1500);
    }

    #[test]
    fn test_cap_resets_each_round() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");
        let he = weapon(&ctx, "grenade_he");

        validate_and_execute(&mut ctx, p, &he, true).unwrap();
        advance(&mut ctx, 1);
        assert!(validate_and_execute(&mut ctx, p, &he, true).is_err());

        ctx.round.reset();
        assert!(validate_and_execute(&mut ctx, p, &he, true).is_ok());
    }

    #[test]
    fn test_armor_purchase_sets_armor_keeps_helmet() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");
        ctx.sessions.get_mut(p).unwrap().helmet = true;
        let kevlar = weapon(&ctx, "kevlar");

        validate_and_execute(&mut ctx, p, &kevlar, true).unwrap();
        advance(&mut ctx, 1);

        let session = ctx.sessions.get(p).unwrap();
        assert_eq!(session.armor, KEVLAR_ARMOR);
        assert!(session.helmet);
        assert!(ctx.effects.drain().iter().any(|e| matches!(
            e,
            EngineEffect::SetArmor {
                armor: KEVLAR_ARMOR,
                helmet: true,
                ..
            }
        )));
    }

    #[test]
    fn test_death_in_window_skips_grant_and_deduction() {
        let mut ctx = sample_context();
        let p = join_defender(&mut ctx, "ada");
        let ak = weapon(&ctx, "rifle_ak");

        validate_and_execute(&mut ctx, p, &ak, true).unwrap();
        ctx.sessions.get_mut(p).unwrap().alive = false;

        advance(&mut ctx, 1);
        let session = ctx.sessions.get(p).unwrap();
        assert_eq!(session.balance, 10_000);
        assert!(session.held.is_empty());
        assert_eq!(ctx.round.purchase_count(p, "rifle_ak"), 0);
    }
}
