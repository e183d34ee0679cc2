use crate::value_objects::symbol::Symbol;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPoint {
    pub symbol: Symbol,
    pub price: f64,
}

/// Points picked from the chart. Every gesture replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    points: Vec<SelectedPoint>,
}

impl Selection {
    pub fn new(points: Vec<SelectedPoint>) -> Self {
        Self { points }
    }

    pub fn replace(&mut self, points: Vec<SelectedPoint>) {
        self.points = points;
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[SelectedPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
