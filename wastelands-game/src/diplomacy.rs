//! Diplomatic proposals: creation, expiry, acceptance, and war declarations.

use thiserror::Error;

use crate::config::EngineConfig;
use crate::state::{
    DiplomaticProposal, DiplomaticStatus, GameState, NarrativeLog, ProposalId, ResourceBundle,
    TribeId,
};

/// Failures raised by the diplomacy command surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiplomacyError {
    #[error("a proposal between these tribes is already pending")]
    ProposalPending,
    #[error("no such proposal")]
    UnknownProposal,
    #[error("no such tribe")]
    UnknownTribe,
    #[error("a tribe cannot negotiate with itself")]
    SelfTarget,
    #[error("a truce holds until turn {until}")]
    TruceActive { until: u32 },
}

fn ensure_pair(state: &GameState, a: TribeId, b: TribeId) -> Result<(), DiplomacyError> {
    if a == b {
        return Err(DiplomacyError::SelfTarget);
    }
    if !state.tribes.contains_key(&a) || !state.tribes.contains_key(&b) {
        return Err(DiplomacyError::UnknownTribe);
    }
    Ok(())
}

fn pair_has_active_proposal(state: &GameState, a: TribeId, b: TribeId) -> bool {
    state.proposals.iter().any(|proposal| {
        (proposal.from == a && proposal.to == b) || (proposal.from == b && proposal.to == a)
    })
}

/// Offer an alliance to another tribe.
///
/// # Errors
///
/// Refused when a proposal already exists between the pair, or the pair
/// is invalid.
pub fn propose_alliance(
    state: &mut GameState,
    from: TribeId,
    to: TribeId,
    cfg: &EngineConfig,
) -> Result<ProposalId, DiplomacyError> {
    create_proposal(state, from, to, DiplomaticStatus::Alliance, None, cfg)
}

/// Sue for peace, optionally sweetening the offer with reparations.
///
/// # Errors
///
/// Same refusal conditions as [`propose_alliance`].
pub fn sue_for_peace(
    state: &mut GameState,
    from: TribeId,
    to: TribeId,
    reparations: Option<ResourceBundle>,
    cfg: &EngineConfig,
) -> Result<ProposalId, DiplomacyError> {
    create_proposal(state, from, to, DiplomaticStatus::Neutral, reparations, cfg)
}

fn create_proposal(
    state: &mut GameState,
    from: TribeId,
    to: TribeId,
    status_change_to: DiplomaticStatus,
    reparations: Option<ResourceBundle>,
    cfg: &EngineConfig,
) -> Result<ProposalId, DiplomacyError> {
    ensure_pair(state, from, to)?;
    // At most one live proposal per unordered pair.
    if pair_has_active_proposal(state, from, to) {
        return Err(DiplomacyError::ProposalPending);
    }
    let id = state.allocate_proposal_id();
    state.proposals.push(DiplomaticProposal {
        id,
        from,
        to,
        status_change_to,
        expires_on_turn: state.turn + cfg.proposal_lifetime,
        reparations,
    });
    Ok(id)
}

/// Accept a pending proposal addressed to `to`.
///
/// Reparations are re-validated at acceptance time; if the proposer spent
/// the promised resources in the meantime the exchange is skipped but the
/// proposal is still consumed.
///
/// # Errors
///
/// Unknown proposal ids are refused.
pub fn accept_proposal(
    state: &mut GameState,
    id: ProposalId,
    cfg: &EngineConfig,
) -> Result<String, DiplomacyError> {
    let index = state
        .proposals
        .iter()
        .position(|proposal| proposal.id == id)
        .ok_or(DiplomacyError::UnknownProposal)?;
    let proposal = state.proposals.remove(index);

    set_status_both(state, proposal.from, proposal.to, proposal.status_change_to);

    let mut summary = format!(
        "Relations between {} and {} are now {}.",
        proposal.from, proposal.to, proposal.status_change_to
    );

    if proposal.status_change_to == DiplomaticStatus::Neutral {
        // Peace installs a mutual truce blocking an immediate new war.
        let until = state.turn + cfg.truce_turns;
        set_truce_both(state, proposal.from, proposal.to, until);
        summary.push_str(&format!(" A truce holds until turn {until}."));
    }

    if let Some(reparations) = proposal.reparations {
        if transfer_reparations(state, proposal.from, proposal.to, reparations) {
            summary.push_str(&format!(" Reparations of {reparations} were paid."));
        } else {
            summary.push_str(" The promised reparations could no longer be paid.");
        }
    }

    Ok(summary)
}

/// Reject and discard a pending proposal; no side effects.
///
/// # Errors
///
/// Unknown proposal ids are refused.
pub fn reject_proposal(state: &mut GameState, id: ProposalId) -> Result<(), DiplomacyError> {
    let index = state
        .proposals
        .iter()
        .position(|proposal| proposal.id == id)
        .ok_or(DiplomacyError::UnknownProposal)?;
    state.proposals.remove(index);
    Ok(())
}

/// Declare war, immediately and symmetrically.
///
/// # Errors
///
/// Blocked while an unexpired truce holds between the pair.
pub fn declare_war(
    state: &mut GameState,
    from: TribeId,
    to: TribeId,
) -> Result<(), DiplomacyError> {
    ensure_pair(state, from, to)?;
    let truce = state
        .tribes
        .get(&from)
        .and_then(|tribe| tribe.diplomacy.get(&to))
        .and_then(|relation| relation.truce_until_turn);
    if let Some(until) = truce
        && state.turn < until
    {
        return Err(DiplomacyError::TruceActive { until });
    }
    set_status_both(state, from, to, DiplomaticStatus::War);
    Ok(())
}

/// Drop every proposal whose expiry has arrived, notifying both parties.
/// Runs as the first phase of each turn.
pub fn expire_proposals(state: &mut GameState, narr: &mut NarrativeLog) {
    let turn = state.turn;
    let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut state.proposals)
        .into_iter()
        .partition(|proposal| proposal.expires_on_turn <= turn);
    state.proposals = live;

    for proposal in expired {
        let what = match proposal.status_change_to {
            DiplomaticStatus::Alliance => "alliance offer",
            _ => "peace offer",
        };
        narr.push(
            proposal.from,
            format!("Your {what} to {} lapsed without an answer.", proposal.to),
        );
        narr.push(
            proposal.to,
            format!("The {what} from {} has lapsed.", proposal.from),
        );
    }
}

fn set_status_both(state: &mut GameState, a: TribeId, b: TribeId, status: DiplomaticStatus) {
    if let Some(tribe) = state.tribes.get_mut(&a) {
        tribe.diplomacy.entry(b).or_default().status = status;
    }
    if let Some(tribe) = state.tribes.get_mut(&b) {
        tribe.diplomacy.entry(a).or_default().status = status;
    }
}

fn set_truce_both(state: &mut GameState, a: TribeId, b: TribeId, until: u32) {
    if let Some(tribe) = state.tribes.get_mut(&a) {
        tribe.diplomacy.entry(b).or_default().truce_until_turn = Some(until);
    }
    if let Some(tribe) = state.tribes.get_mut(&b) {
        tribe.diplomacy.entry(a).or_default().truce_until_turn = Some(until);
    }
}

/// Move the bundle from payer to payee: food and scrap directly, weapons
/// debited across the payer's garrisons. Returns `false` (no transfer)
/// when the payer can no longer cover it.
fn transfer_reparations(
    state: &mut GameState,
    payer: TribeId,
    payee: TribeId,
    bundle: ResourceBundle,
) -> bool {
    let affordable = state.tribes.get(&payer).is_some_and(|tribe| {
        tribe.resources.food >= bundle.food
            && tribe.resources.scrap >= bundle.scrap
            && tribe.total_weapons() >= bundle.weapons
    });
    if !affordable {
        return false;
    }

    if let Some(tribe) = state.tribes.get_mut(&payer) {
        tribe.resources.food -= bundle.food;
        tribe.resources.scrap -= bundle.scrap;
        tribe.debit_weapons(bundle.weapons);
    }
    if let Some(tribe) = state.tribes.get_mut(&payee) {
        tribe.resources.food = tribe.resources.food.saturating_add(bundle.food);
        tribe.resources.scrap = tribe.resources.scrap.saturating_add(bundle.scrap);
        // Weapons land in the payee's first garrison; with none standing
        // they are considered lost in transit.
        if let Some(garrison) = tribe.garrisons.values_mut().next() {
            garrison.weapons += bundle.weapons;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Axial;
    use crate::state::{Garrison, Tribe};

    fn two_tribe_state() -> GameState {
        let mut state = GameState::default();
        for id in [1, 2] {
            let mut tribe = Tribe {
                name: format!("Tribe {id}"),
                ..Tribe::default()
            };
            tribe.resources.food = 100;
            tribe.resources.scrap = 100;
            tribe
                .garrisons
                .insert(Axial::new(0, id).key(), Garrison::new(10, 10));
            state.tribes.insert(TribeId(id.unsigned_abs()), tribe);
        }
        state
    }

    #[test]
    fn only_one_proposal_per_pair() {
        let cfg = EngineConfig::default();
        let mut state = two_tribe_state();

        propose_alliance(&mut state, TribeId(1), TribeId(2), &cfg).unwrap();
        // Same pair in either direction is refused.
        assert_eq!(
            propose_alliance(&mut state, TribeId(2), TribeId(1), &cfg),
            Err(DiplomacyError::ProposalPending)
        );
        assert_eq!(
            sue_for_peace(&mut state, TribeId(1), TribeId(2), None, &cfg),
            Err(DiplomacyError::ProposalPending)
        );
        assert_eq!(state.proposals.len(), 1);
    }

    #[test]
    fn acceptance_sets_both_sides() {
        let cfg = EngineConfig::default();
        let mut state = two_tribe_state();
        let id = propose_alliance(&mut state, TribeId(1), TribeId(2), &cfg).unwrap();

        accept_proposal(&mut state, id, &cfg).unwrap();
        assert!(state.proposals.is_empty());
        assert_eq!(
            state.tribes[&TribeId(1)].relation(TribeId(2)),
            DiplomaticStatus::Alliance
        );
        assert_eq!(
            state.tribes[&TribeId(2)].relation(TribeId(1)),
            DiplomaticStatus::Alliance
        );
    }

    #[test]
    fn peace_installs_truce_and_pays_reparations() {
        let cfg = EngineConfig::default();
        let mut state = two_tribe_state();
        set_status_both(&mut state, TribeId(1), TribeId(2), DiplomaticStatus::War);

        let id = sue_for_peace(
            &mut state,
            TribeId(1),
            TribeId(2),
            Some(ResourceBundle::new(20, 10, 5)),
            &cfg,
        )
        .unwrap();
        let summary = accept_proposal(&mut state, id, &cfg).unwrap();
        assert!(summary.contains("Reparations"));

        let payer = &state.tribes[&TribeId(1)];
        assert_eq!(payer.resources.food, 80);
        assert_eq!(payer.resources.scrap, 90);
        assert_eq!(payer.total_weapons(), 5);
        let payee = &state.tribes[&TribeId(2)];
        assert_eq!(payee.resources.food, 120);
        assert_eq!(payee.total_weapons(), 15);

        // War is blocked while the truce holds.
        assert_eq!(
            declare_war(&mut state, TribeId(2), TribeId(1)),
            Err(DiplomacyError::TruceActive {
                until: cfg.truce_turns
            })
        );
        state.turn = cfg.truce_turns;
        declare_war(&mut state, TribeId(2), TribeId(1)).unwrap();
        assert!(state.tribes[&TribeId(1)].is_at_war(TribeId(2)));
    }

    #[test]
    fn unaffordable_reparations_skip_the_exchange_but_consume_the_proposal() {
        let cfg = EngineConfig::default();
        let mut state = two_tribe_state();
        let id = sue_for_peace(
            &mut state,
            TribeId(1),
            TribeId(2),
            Some(ResourceBundle::new(500, 0, 0)),
            &cfg,
        )
        .unwrap();

        let summary = accept_proposal(&mut state, id, &cfg).unwrap();
        assert!(summary.contains("could no longer be paid"));
        assert!(state.proposals.is_empty());
        assert_eq!(state.tribes[&TribeId(1)].resources.food, 100);
        assert_eq!(state.tribes[&TribeId(2)].resources.food, 100);
        // The relation change itself still happened.
        assert_eq!(
            state.tribes[&TribeId(1)].relation(TribeId(2)),
            DiplomaticStatus::Neutral
        );
    }

    #[test]
    fn rejection_has_no_side_effects() {
        let cfg = EngineConfig::default();
        let mut state = two_tribe_state();
        let id = propose_alliance(&mut state, TribeId(1), TribeId(2), &cfg).unwrap();
        let before = state.tribes.clone();

        reject_proposal(&mut state, id).unwrap();
        assert!(state.proposals.is_empty());
        assert_eq!(state.tribes, before);
        assert_eq!(
            reject_proposal(&mut state, id),
            Err(DiplomacyError::UnknownProposal)
        );
    }

    #[test]
    fn expiry_notifies_both_parties() {
        let cfg = EngineConfig::default();
        let mut state = two_tribe_state();
        propose_alliance(&mut state, TribeId(1), TribeId(2), &cfg).unwrap();
        state.turn += cfg.proposal_lifetime;

        let mut narr = NarrativeLog::default();
        expire_proposals(&mut state, &mut narr);
        assert!(state.proposals.is_empty());
        assert_eq!(narr.entries(TribeId(1)).len(), 1);
        assert_eq!(narr.entries(TribeId(2)).len(), 1);
    }
}
