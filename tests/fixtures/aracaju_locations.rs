//! Real locations in Aracaju, Sergipe (Brazil).
//!
//! Coordinates taken from OpenStreetMap. Groups are chosen so that points
//! inside a group sit well within a kilometer of each other while the groups
//! themselves are several kilometers apart.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

// ============================================================================
// Centro (historic centre)
// ============================================================================

pub const CENTRO: &[Location] = &[
    Location::new("Praça Fausto Cardoso", -10.9111, -37.0494),
    Location::new("Mercado Municipal Antônio Franco", -10.9078, -37.0503),
    Location::new("Catedral Metropolitana", -10.9113, -37.0529),
    Location::new("Praça General Valadão", -10.9095, -37.0500),
    Location::new("Rua João Pessoa", -10.9120, -37.0510),
];

// ============================================================================
// Atalaia (beachfront)
// ============================================================================

pub const ATALAIA: &[Location] = &[
    Location::new("Passarela do Caranguejo", -10.9857, -37.0436),
    Location::new("Arcos da Orla", -10.9797, -37.0459),
    Location::new("Oceanário de Aracaju", -10.9864, -37.0418),
    Location::new("Praça de Eventos da Orla", -10.9830, -37.0445),
];

// ============================================================================
// Zona Norte
// ============================================================================

pub const ZONA_NORTE: &[Location] = &[
    Location::new("Bairro Santos Dumont", -10.8870, -37.0720),
    Location::new("Bairro Lamarão", -10.8835, -37.0745),
    Location::new("Bairro Japãozinho", -10.8900, -37.0755),
];

/// Hospital de Urgência de Sergipe, a convenient depot between the groups.
pub const HOSPITAL: Location = Location::new("Hospital de Urgência de Sergipe", -10.9286, -37.0658);
