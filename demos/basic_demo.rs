//! Basic demonstration of the brawl simulation.
//!
//! Run with: cargo run --example basic_demo

use brawl_sim::systems::events_to_json_lines;
use brawl_sim::{logging, Facing, GameEvent, GameWorld, LevelLayout, SimConfig, TriggerSource};

fn main() {
    logging::init(false);
    println!("=== Brawl - Simulation Demo ===\n");

    let layout = LevelLayout::arena();
    let mut game = match GameWorld::from_level(&layout, SimConfig::default()) {
        Ok(game) => game,
        Err(err) => {
            eprintln!("failed to load level: {err}");
            return;
        }
    };

    println!("Initial state:");
    print_snapshot(&mut game);

    // 12 seconds at 60 Hz; swing at whatever is closest every half second.
    println!("\nRunning for 12 seconds...\n");
    for frame in 0..720u32 {
        if frame % 30 == 0 {
            aim_at_nearest(&mut game);
            game.press_attack(TriggerSource::Keyboard);
        }
        game.step(1.0 / 60.0);

        // Presentation cues are noisy; print gameplay events only.
        let events: Vec<GameEvent> = game
            .drain_events()
            .into_iter()
            .filter(|event| {
                !matches!(
                    event,
                    GameEvent::Sound { .. }
                        | GameEvent::Animation { .. }
                        | GameEvent::Effect { .. }
                        | GameEvent::AttackRelayed
                )
            })
            .collect();
        match events_to_json_lines(&events) {
            Ok(lines) => {
                for line in lines.lines() {
                    println!("  t={:.2}s {line}", game.current_time());
                }
            }
            Err(err) => eprintln!("event encoding failed: {err}"),
        }

        if (frame + 1) % 240 == 0 {
            println!("--- Tick {} (t={:.1}s) ---", game.current_tick(), game.current_time());
            print_snapshot(&mut game);
        }
    }

    println!("\n=== Final State (JSON) ===\n");
    match game.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("snapshot failed: {err}"),
    }
}

fn aim_at_nearest(game: &mut GameWorld) {
    let snapshot = game.snapshot();
    let Some(player) = snapshot.player else {
        return;
    };
    let nearest = snapshot
        .entities
        .iter()
        .filter(|e| e.category.is_enemy())
        .min_by(|a, b| {
            let da = (a.x - player.x).hypot(a.y - player.y);
            let db = (b.x - player.x).hypot(b.y - player.y);
            da.total_cmp(&db)
        });
    if let Some(target) = nearest {
        let facing = Facing::from_vector(target.x - player.x, target.y - player.y);
        let _ = game.set_facing(facing);
    }
}

fn print_snapshot(game: &mut GameWorld) {
    let snapshot = game.snapshot();
    if let Some(player) = &snapshot.player {
        println!(
            "  Player {}: pos=({:.1}, {:.1}) life={}/{} {:?}",
            player.id, player.x, player.y, player.life, player.max_life, player.status
        );
    }
    println!("  Kills: {}", snapshot.kills);
    for boss in &snapshot.bosses {
        println!(
            "  Gate {}: {:?} hearts={}/{}",
            boss.id, boss.state, boss.health, boss.health_max
        );
    }
    for entity in &snapshot.entities {
        println!(
            "  {:?} {}: pos=({:.1}, {:.1}) scale={:.2} [{}]",
            entity.category, entity.id, entity.x, entity.y, entity.scale, entity.state
        );
    }
}
