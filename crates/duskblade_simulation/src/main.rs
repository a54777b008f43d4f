//! Headless симуляция Duskblade
//!
//! Скриптованный бой: игрок стоит на месте и бьёт комбо, пока враги живы.
//! Запускает Bevy App без рендера (детерминизм по seed).

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use duskblade_simulation::{
    create_headless_app, log_info, spawn_enemy, spawn_obstacle, spawn_player, CombatTuning, EnemySpawn, Health,
    PlayerAction, TargetLock,
};

const TICKS: u32 = 1200;

fn main() {
    let seed = 42;
    println!("Starting Duskblade headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)));

    let tuning = app.world().resource::<CombatTuning>().clone();
    let player = {
        let mut commands = app.world_mut().commands();
        let player = spawn_player(&mut commands, Vec3::ZERO, &tuning);
        spawn_enemy(&mut commands, EnemySpawn::from_tuning(Vec3::new(0.0, 0.0, -6.0), &tuning));
        spawn_enemy(
            &mut commands,
            EnemySpawn::from_tuning(Vec3::new(5.0, 0.0, -8.0), &tuning).ranged(),
        );
        spawn_obstacle(&mut commands, Vec3::new(-4.0, 1.0, -4.0), Vec3::new(1.0, 1.0, 1.0));
        player
    };
    app.world_mut().flush();

    for tick in 0..TICKS {
        if tick == 30 {
            app.world_mut().send_event(PlayerAction::ToggleLock);
        }
        if tick > 60 && tick % 20 == 0 {
            app.world_mut().send_event(PlayerAction::AttackPressed);
        }

        app.update();

        if tick % 120 == 0 {
            let player_health = app.world().get::<Health>(player).map(|h| h.current()).unwrap_or(0);
            let lock = app.world().resource::<TargetLock>().get();
            log_info(&format!(
                "Tick {}: {} entities, player hp {}, lock {:?}",
                tick,
                app.world().entities().len(),
                player_health,
                lock
            ));
        }
    }

    println!("Simulation complete!");
}
