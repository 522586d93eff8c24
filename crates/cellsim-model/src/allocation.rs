//! Channel allocation policies.
//!
//! Every pass takes the users still `Unassigned` after construction and gives
//! each of them exactly one channel. Interference sums only ever look at users
//! that already hold a channel.

use cellsim_common::{Channel, SimError, UserId};
use cellsim_radio::{AccessPoint, UserEquipment};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

fn access_point_of<'a>(aps: &'a [AccessPoint], user: &UserEquipment) -> Result<&'a AccessPoint, SimError> {
    aps.get(user.access_point().0)
        .ok_or(SimError::AccessPointNotFound(user.access_point()))
}

fn user_mut(users: &mut [UserEquipment], id: UserId) -> Result<&mut UserEquipment, SimError> {
    users.get_mut(id.0).ok_or(SimError::UserNotFound(id))
}

/// Index of the smallest value, ties to the first.
fn argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().copied().enumerate() {
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the largest value, ties to the first.
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().copied().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Shuffled round-robin per access point.
///
/// Each access point hands out a shuffled copy of its channels to its members
/// in membership order. Users left over once the list runs out take the
/// channel with the fewest assignees system-wide, in ascending user order.
pub fn round_robin<R: Rng + ?Sized>(
    aps: &[AccessPoint],
    users: &mut [UserEquipment],
    number_channels: u32,
    rng: &mut R,
) -> Result<(), SimError> {
    let mut counts = vec![0usize; number_channels as usize];
    let mut leftovers = Vec::new();

    for ap in aps {
        let mut channels: Vec<Channel> = ap.channels().collect();
        channels.shuffle(rng);

        for (slot, &id) in ap.users().iter().enumerate() {
            match channels.get(slot) {
                Some(&channel) => {
                    let count = counts.get_mut(channel.index()).ok_or(SimError::ChannelOutOfRange {
                        channel: channel.number(),
                        number_channels,
                    })?;
                    *count += 1;
                    user_mut(users, id)?.assign_channel(channel);
                    trace!(user = %id, ap = %ap.id(), channel = %channel, "round-robin slot");
                }
                None => leftovers.push(id),
            }
        }
    }

    leftovers.sort();
    for id in leftovers {
        let loads: Vec<f64> = counts.iter().map(|c| *c as f64).collect();
        let index = argmin(&loads).ok_or_else(|| SimError::InvalidConfig("no channels to allocate".to_string()))?;
        let channel = Channel::from_index(index);
        user_mut(users, id)?.assign_channel(channel);
        counts[index] += 1;
        trace!(user = %id, channel = %channel, "round-robin leftover");
    }

    Ok(())
}

/// Fading-aware direct mapping.
///
/// User `i < number_channels` gets channel `i + 1`; every later user the
/// channel with the strongest multipath amplitude at its own access point.
pub fn papoa(aps: &[AccessPoint], users: &mut [UserEquipment], number_channels: u32) -> Result<(), SimError> {
    for user in users.iter_mut() {
        let id = user.id();
        let channel = if id.0 < number_channels as usize {
            Channel::from_index(id.0)
        } else {
            let row = access_point_of(aps, user)?.multipath_row(id)?;
            let index = argmax(row).ok_or_else(|| SimError::InvalidConfig("no channels to allocate".to_string()))?;
            Channel::from_index(index)
        };
        user.assign_channel(channel);
        trace!(user = %id, channel = %channel, "papoa");
    }
    Ok(())
}

/// Greedy interference-minimizing allocation.
///
/// Users are visited in ascending order. Each takes the channel on which the
/// power received at its own access point from already-assigned users, plus
/// the noise floor, is lowest. The result depends on the visiting order.
pub fn imca(aps: &[AccessPoint], users: &mut [UserEquipment]) -> Result<(), SimError> {
    for index in 0..users.len() {
        let ap = access_point_of(aps, &users[index])?;

        let mut costs = Vec::with_capacity(ap.number_channels() as usize);
        for channel in ap.channels() {
            let mut interference = ap.noise_power();
            for (other_index, other) in users.iter().enumerate() {
                if other_index != index && other.occupies(channel) {
                    interference += other.power_received_on(ap, channel)?;
                }
            }
            costs.push(interference);
        }

        let best = argmin(&costs).ok_or_else(|| SimError::InvalidConfig("no channels to allocate".to_string()))?;
        let channel = Channel::from_index(best);
        let user = &mut users[index];
        user.assign_channel(channel);
        trace!(user = %user.id(), channel = %channel, cost = costs[best], "imca");
    }
    Ok(())
}

/// Let every user that is alone at its access point transmit on all channels.
pub fn apply_aggregation(aps: &[AccessPoint], users: &mut [UserEquipment]) -> Result<(), SimError> {
    for ap in aps {
        if let [only] = ap.users() {
            user_mut(users, *only)?.enable_aggregation(ap.number_channels());
            trace!(user = %only, ap = %ap.id(), "aggregating all channels");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellsim_common::{AccessPointId, Position};
    use cellsim_radio::{TransmitPower, UserConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const CONFIG: UserConfig = UserConfig {
        size_m: 100.0,
        random_channel: false,
        power: TransmitPower::Fixed(1.0),
    };

    /// Access points plus users at the given positions, with memberships filled.
    fn build(ap_positions: &[(f64, f64)], ue_positions: &[(f64, f64)], channels: u32, multipath: Vec<Vec<f64>>) -> (Vec<AccessPoint>, Vec<UserEquipment>) {
        let mut aps: Vec<AccessPoint> = ap_positions
            .iter()
            .enumerate()
            .map(|(i, (x, y))| {
                AccessPoint::new(
                    AccessPointId(i),
                    Position::new(*x, *y),
                    channels,
                    100e6,
                    vec![1.0; ue_positions.len()],
                    multipath.clone(),
                )
                .unwrap()
            })
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let users: Vec<UserEquipment> = ue_positions
            .iter()
            .enumerate()
            .map(|(i, (x, y))| UserEquipment::at_position(UserId(i), Position::new(*x, *y), &aps, &CONFIG, &mut rng).unwrap())
            .collect();
        for ue in &users {
            aps[ue.access_point().0].attach_user(ue.id());
        }
        (aps, users)
    }

    fn channel_of(ue: &UserEquipment) -> u32 {
        ue.channel().channel().unwrap().number()
    }

    #[test]
    fn test_argmin_argmax_ties_to_first() {
        assert_eq!(argmin(&[2.0, 1.0, 1.0]), Some(1));
        assert_eq!(argmax(&[3.0, 1.0, 3.0]), Some(0));
        assert_eq!(argmin(&[]), None);
    }

    #[test]
    fn test_round_robin_balances_batches() {
        let positions: Vec<(f64, f64)> = (0..7).map(|i| (10.0 + i as f64, 10.0)).collect();
        let (aps, mut users) = build(&[(10.0, 10.0)], &positions, 3, vec![vec![1.0; 3]; 7]);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        round_robin(&aps, &mut users, 3, &mut rng).unwrap();

        let mut counts = [0usize; 3];
        for ue in &users {
            counts[(channel_of(ue) - 1) as usize] += 1;
        }
        assert_eq!(counts.iter().sum::<usize>(), 7);
        let min = *counts.iter().min().unwrap();
        assert!(counts.iter().all(|c| *c <= min + 1), "{:?}", counts);

        // The first batch covers every channel exactly once
        let mut first: Vec<u32> = users[..3].iter().map(channel_of).collect();
        first.sort();
        assert_eq!(first, vec![1, 2, 3]);
    }

    #[test]
    fn test_round_robin_leftovers_take_least_loaded_lowest_channel() {
        let positions: Vec<(f64, f64)> = (0..5).map(|i| (20.0 + i as f64, 10.0)).collect();
        let (aps, mut users) = build(&[(10.0, 10.0)], &positions, 3, vec![vec![1.0; 3]; 5]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        round_robin(&aps, &mut users, 3, &mut rng).unwrap();

        let mut first: Vec<u32> = users[..3].iter().map(channel_of).collect();
        first.sort();
        assert_eq!(first, vec![1, 2, 3]);

        // All loads tie at one, so ue3 takes channel 1; then channels 2 and 3 tie
        assert_eq!(channel_of(&users[3]), 1);
        assert_eq!(channel_of(&users[4]), 2);
    }

    #[test]
    fn test_round_robin_rejects_channels_beyond_system_count() {
        let positions: Vec<(f64, f64)> = (0..4).map(|i| (20.0 + i as f64, 10.0)).collect();
        let (aps, mut users) = build(&[(10.0, 10.0)], &positions, 4, vec![vec![1.0; 4]; 4]);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let result = round_robin(&aps, &mut users, 2, &mut rng);
        assert!(matches!(
            result,
            Err(SimError::ChannelOutOfRange { number_channels: 2, .. })
        ));
    }

    #[test]
    fn test_papoa_direct_then_best_fading() {
        let multipath = vec![
            vec![1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
            vec![0.2, 1.9, 0.4],
            vec![0.7, 0.7, 0.1],
        ];
        let positions = [(1.0, 1.0), (2.0, 1.0), (3.0, 1.0), (4.0, 1.0), (5.0, 1.0)];
        let (aps, mut users) = build(&[(0.0, 0.0)], &positions, 3, multipath);

        papoa(&aps, &mut users, 3).unwrap();

        let channels: Vec<u32> = users.iter().map(channel_of).collect();
        assert_eq!(channels, vec![1, 2, 3, 2, 1]);
    }

    #[test]
    fn test_imca_avoids_occupied_channel() {
        let positions = [(5.0, 0.0), (6.0, 0.0), (7.0, 0.0)];
        let (aps, mut users) = build(&[(0.0, 0.0)], &positions, 2, vec![vec![1.0; 2]; 3]);

        imca(&aps, &mut users).unwrap();

        // Empty system: ties to channel 1; the second user avoids it; the third
        // joins the channel whose occupant is received more weakly (user 1, farther).
        let channels: Vec<u32> = users.iter().map(channel_of).collect();
        assert_eq!(channels, vec![1, 2, 2]);
    }

    #[test]
    fn test_imca_is_order_dependent() {
        // Reversing geometry reverses which user lands on the shared channel
        let (aps, mut forward) = build(&[(0.0, 0.0)], &[(5.0, 0.0), (6.0, 0.0), (7.0, 0.0)], 2, vec![vec![1.0; 2]; 3]);
        imca(&aps, &mut forward).unwrap();
        let (aps, mut backward) = build(&[(0.0, 0.0)], &[(7.0, 0.0), (6.0, 0.0), (5.0, 0.0)], 2, vec![vec![1.0; 2]; 3]);
        imca(&aps, &mut backward).unwrap();

        let f: Vec<u32> = forward.iter().map(channel_of).collect();
        let b: Vec<u32> = backward.iter().map(channel_of).collect();
        assert_eq!(f, vec![1, 2, 2]);
        assert_eq!(b, vec![1, 2, 1]);
    }

    #[test]
    fn test_aggregation_only_for_lone_users() {
        let positions = [(1.0, 1.0), (2.0, 1.0), (99.0, 99.0)];
        let (aps, mut users) = build(&[(0.0, 0.0), (100.0, 100.0)], &positions, 4, vec![vec![1.0; 4]; 3]);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        round_robin(&aps, &mut users, 4, &mut rng).unwrap();

        apply_aggregation(&aps, &mut users).unwrap();

        assert!(!users[0].is_aggregated());
        assert!(!users[1].is_aggregated());
        assert!(users[2].is_aggregated());
        assert_eq!(users[2].power(), 0.25);
    }
}
