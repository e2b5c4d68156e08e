//! Property tests: follow stats always agree with the live edge set.

mod support;

use std::collections::HashSet;

use proptest::prelude::*;
use yapper_users::models::UserId;
use yapper_users::services::{ConflictReason, InvalidReason, ServiceError};

use support::{local_service, seed_users};

const USERS: usize = 5;

#[derive(Debug, Clone, Copy)]
enum Op {
    Follow(usize, usize),
    Unfollow(usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    (any::<bool>(), 0..USERS, 0..USERS).prop_map(|(follow, a, b)| {
        if follow {
            Op::Follow(a, b)
        } else {
            Op::Unfollow(a, b)
        }
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stats_match_model_after_any_sequence(ops in prop::collection::vec(op_strategy(), 0..40)) {
        runtime().block_on(async {
            let (_repo, service) = local_service();
            let ids = seed_users(&service, USERS).await;
            let mut model: HashSet<(usize, usize)> = HashSet::new();

            for op in ops {
                match op {
                    Op::Follow(a, b) => {
                        let result = service.follow(ids[a], ids[b]).await;
                        if a == b {
                            prop_assert!(
                                matches!(result, Err(ServiceError::InvalidInput { reason: InvalidReason::SelfFollow })),
                                "self follow returned {:?}", result
                            );
                        } else if model.insert((a, b)) {
                            prop_assert!(result.is_ok(), "expected success, got {:?}", result);
                        } else {
                            prop_assert!(
                                matches!(result, Err(ServiceError::Conflict { reason: ConflictReason::AlreadyFollowing })),
                                "repeated follow returned {:?}", result
                            );
                        }
                    }
                    Op::Unfollow(a, b) => {
                        let result = service.unfollow(ids[a], ids[b]).await;
                        if a == b {
                            prop_assert!(
                                matches!(result, Err(ServiceError::InvalidInput { .. })),
                                "self unfollow returned {:?}", result
                            );
                        } else if model.remove(&(a, b)) {
                            prop_assert!(result.is_ok(), "expected success, got {:?}", result);
                        } else {
                            prop_assert!(
                                matches!(result, Err(ServiceError::Conflict { reason: ConflictReason::AlreadyNotFollowing })),
                                "unfollow without edge returned {:?}", result
                            );
                        }
                    }
                }
            }

            for (i, id) in ids.iter().enumerate() {
                let stats = service.follow_stats(*id).await.unwrap();
                let followers = model.iter().filter(|(_, b)| *b == i).count() as i64;
                let following = model.iter().filter(|(a, _)| *a == i).count() as i64;
                prop_assert_eq!(stats.followers_count, followers);
                prop_assert_eq!(stats.following_count, following);

                let listed: HashSet<UserId> = service.list_followers(*id).await.unwrap().into_iter().collect();
                let expected: HashSet<UserId> = model
                    .iter()
                    .filter(|(_, b)| *b == i)
                    .map(|(a, _)| ids[*a])
                    .collect();
                prop_assert_eq!(listed, expected);
            }

            for a in 0..USERS {
                for b in 0..USERS {
                    if a != b {
                        let following = service.is_following(ids[a], ids[b]).await.unwrap();
                        prop_assert_eq!(following, model.contains(&(a, b)));
                    }
                }
            }
            Ok(())
        })?;
    }
}
