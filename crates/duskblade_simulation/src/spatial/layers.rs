//! Collision layers (Rapier `Group` bitflags)
//!
//! Один слой на тип тела, маски запросов собираются через `union`.

use bevy_rapier3d::prelude::{CollisionGroups, Group};

/// Layer 1: Player body
pub const LAYER_PLAYER: Group = Group::GROUP_2;

/// Layer 2: Enemy bodies (+ hurtboxes, которыми владеет враг)
pub const LAYER_ENEMY: Group = Group::GROUP_3;

/// Layer 3: Environment (стены, колонны, укрытия)
pub const LAYER_ENVIRONMENT: Group = Group::GROUP_4;

/// Layer 4: Crosshair / UI raycast helpers
pub const LAYER_CROSSHAIR: Group = Group::GROUP_5;

/// Layer 5: Projectiles
pub const LAYER_PROJECTILE: Group = Group::GROUP_6;

pub const LAYER_ALL: Group = Group::ALL;

/// Mask: всё, что блокирует взгляд врага на игрока
pub const ENEMY_SIGHT_MASK: Group = LAYER_PLAYER.union(LAYER_ENVIRONMENT);

/// Mask: LOS для lock-on (игрок и crosshair игнорируются)
pub const LOCK_SIGHT_MASK: Group = LAYER_ALL.difference(LAYER_PLAYER.union(LAYER_CROSSHAIR).union(LAYER_PROJECTILE));

/// Группы тела: принадлежит `layer`, виден любым запросам
pub fn body_groups(layer: Group) -> CollisionGroups {
    CollisionGroups::new(layer, Group::ALL)
}

/// Проходит ли коллайдер фильтр запроса с маской `mask`
pub fn matches_mask(groups: &CollisionGroups, mask: Group) -> bool {
    groups.memberships.intersects(mask)
}

pub fn layer_name(layer: Group) -> &'static str {
    if layer == LAYER_PLAYER {
        "player"
    } else if layer == LAYER_ENEMY {
        "enemy"
    } else if layer == LAYER_ENVIRONMENT {
        "environment"
    } else if layer == LAYER_CROSSHAIR {
        "crosshair"
    } else if layer == LAYER_PROJECTILE {
        "projectile"
    } else {
        "mixed"
    }
}
