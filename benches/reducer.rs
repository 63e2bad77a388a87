//! Benchmarks for folding action batches.
//!
//! The reducer clones collections on first write, so batch size and state
//! size both matter.

#![allow(missing_docs)]

use std::hint::black_box;

use chrono::{DateTime, Utc};
use criterion::{criterion_group, criterion_main, Criterion};
use political_sphere::{
    advance_game_state,
    game::state::{GameState, Player, VoteChoice},
    PlayerAction,
};

fn game(players: usize) -> GameState {
    GameState::new("bench", "Bench", DateTime::<Utc>::UNIX_EPOCH).with_players(
        (0..players)
            .map(|i| Player::new(format!("p{i}"), format!("Player {i}")))
            .collect(),
    )
}

fn bench_propose_batch(c: &mut Criterion) {
    let state = game(8);
    let batch: Vec<PlayerAction> = (0..100)
        .map(|i| PlayerAction::propose(format!("Bill {i}"), "", format!("p{}", i % 8)))
        .collect();

    c.bench_function("propose_100", |b| {
        b.iter(|| {
            let result = advance_game_state(black_box(&state), black_box(&batch), black_box(42));
            black_box(result)
        });
    });
}

fn bench_full_vote(c: &mut Criterion) {
    let base = game(50);
    let state = advance_game_state(&base, &[PlayerAction::propose("Budget", "", "p0")], 7)
        .unwrap_or(base);
    let proposal_id = state.proposals.first().map(|p| p.id.clone()).unwrap_or_default();
    let batch: Vec<PlayerAction> = (0..50)
        .map(|i| PlayerAction::vote(proposal_id.clone(), format!("p{i}"), VoteChoice::For))
        .collect();

    c.bench_function("vote_quorum_50", |b| {
        b.iter(|| {
            let result = advance_game_state(black_box(&state), black_box(&batch), black_box(8));
            black_box(result)
        });
    });
}

fn bench_advance_turns(c: &mut Criterion) {
    let state = game(4);
    let batch = vec![PlayerAction::advance_turn(); 1000];

    c.bench_function("advance_turn_1000", |b| {
        b.iter(|| {
            let result = advance_game_state(black_box(&state), black_box(&batch), black_box(1));
            black_box(result)
        });
    });
}

criterion_group!(benches, bench_propose_batch, bench_full_vote, bench_advance_turns);
criterion_main!(benches);
