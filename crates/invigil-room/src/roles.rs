//! Role dealing.

use std::collections::{HashMap, HashSet};

use invigil_protocol::Role;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::{RoomConfig, RoomError};

/// Deals one role to each name.
///
/// Every deal contains exactly one [`Role::Cheater`] and exactly one
/// [`Role::Invigilator`], whatever the roster size. The remaining
/// `n - 2` seats are drawn without replacement from the other four slots
/// of [`Role::SLOTS`] (`VC`, `Professor`, `Student`, `Student`), and the
/// full set is then shuffled over the players, so each player is equally
/// likely to receive either key role.
///
/// Names must be distinct and there must be between
/// [`RoomConfig::MIN_ROSTER`] and six of them.
pub fn assign_roles<R>(
    names: &[String],
    rng: &mut R,
) -> Result<HashMap<String, Role>, RoomError>
where
    R: Rng + ?Sized,
{
    let n = names.len();
    if n < RoomConfig::MIN_ROSTER {
        return Err(RoomError::InsufficientPlayers {
            have: n,
            need: RoomConfig::MIN_ROSTER,
        });
    }
    if n > Role::SLOTS.len() {
        return Err(RoomError::TooManyPlayers {
            have: n,
            max: Role::SLOTS.len(),
        });
    }

    let mut seen = HashSet::with_capacity(n);
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(RoomError::DuplicateName(name.clone()));
        }
    }

    let mut bystanders: Vec<Role> = Role::SLOTS
        .iter()
        .copied()
        .filter(|role| !matches!(role, Role::Cheater | Role::Invigilator))
        .collect();
    bystanders.shuffle(rng);

    let mut deal = Vec::with_capacity(n);
    deal.push(Role::Cheater);
    deal.push(Role::Invigilator);
    deal.extend(bystanders.into_iter().take(n - 2));
    deal.shuffle(rng);

    Ok(names.iter().cloned().zip(deal).collect())
}
