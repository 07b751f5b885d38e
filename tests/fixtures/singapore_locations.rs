//! Singapore hawker centres and landmarks for realistic test fixtures.

#![allow(dead_code)]

use hawker_route::Coordinate;

/// A named place.
#[derive(Debug, Clone, Copy)]
pub struct Place {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Place {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coord(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng).expect("fixture coordinates are valid")
    }
}

// ============================================================================
// Central / Chinatown cluster (walkable, a few hundred meters apart)
// ============================================================================

pub const MAXWELL: Place = Place::new("Maxwell Food Centre", 1.2803, 103.8448);
pub const AMOY_STREET: Place = Place::new("Amoy Street Food Centre", 1.2793, 103.8466);
pub const LAU_PA_SAT: Place = Place::new("Lau Pa Sat", 1.2807, 103.8504);
pub const CHINATOWN_COMPLEX: Place = Place::new("Chinatown Complex", 1.2825, 103.8431);
pub const HONG_LIM: Place = Place::new("Hong Lim Market", 1.2853, 103.8456);
pub const TIONG_BAHRU: Place = Place::new("Tiong Bahru Market", 1.2852, 103.8324);

pub const CENTRAL: &[Place] = &[
    MAXWELL,
    AMOY_STREET,
    LAU_PA_SAT,
    CHINATOWN_COMPLEX,
    HONG_LIM,
    TIONG_BAHRU,
];

// ============================================================================
// Further out (several kilometers from the central cluster)
// ============================================================================

pub const TEKKA: Place = Place::new("Tekka Centre", 1.3063, 103.8505);
pub const NEWTON: Place = Place::new("Newton Food Centre", 1.3120, 103.8396);
pub const GOLDEN_MILE: Place = Place::new("Golden Mile Food Centre", 1.3030, 103.8640);
pub const OLD_AIRPORT_ROAD: Place = Place::new("Old Airport Road Food Centre", 1.3081, 103.8854);
pub const ADAM_ROAD: Place = Place::new("Adam Road Food Centre", 1.3240, 103.8140);

pub const OUTER: &[Place] = &[TEKKA, NEWTON, GOLDEN_MILE, OLD_AIRPORT_ROAD, ADAM_ROAD];
