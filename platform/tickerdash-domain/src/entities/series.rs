use crate::services::palette::ColorPalette;
use crate::value_objects::color::Rgb;
use crate::value_objects::sample::PriceSample;
use crate::value_objects::symbol::Symbol;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedSeries {
    pub symbol: Symbol,
    pub color: Rgb,
    samples: Vec<PriceSample>,
}

impl TrackedSeries {
    fn new(symbol: Symbol, color: Rgb) -> Self {
        Self {
            symbol,
            color,
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, sample: PriceSample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.last()
    }

    /// First sample (in arrival order) whose price equals `price`.
    pub fn first_at_price(&self, price: f64) -> Option<&PriceSample> {
        self.samples.iter().find(|s| s.price == price)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// All tracked series in first-add order. Tickers are never removed.
#[derive(Debug, Clone, Default)]
pub struct SeriesBook {
    series: Vec<TrackedSeries>,
    index: HashMap<Symbol, usize>,
}

impl SeriesBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the series for `symbol`, creating it with the next palette color
    /// on first sight. The bool is `true` when the series was just created.
    pub fn track(&mut self, symbol: &Symbol, palette: &mut ColorPalette) -> (&mut TrackedSeries, bool) {
        if let Some(&idx) = self.index.get(symbol) {
            return (&mut self.series[idx], false);
        }
        let idx = self.series.len();
        self.series
            .push(TrackedSeries::new(symbol.clone(), palette.next_color()));
        self.index.insert(symbol.clone(), idx);
        (&mut self.series[idx], true)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&TrackedSeries> {
        self.index.get(symbol).map(|&idx| &self.series[idx])
    }

    pub fn get_mut(&mut self, symbol: &Symbol) -> Option<&mut TrackedSeries> {
        self.index.get(symbol).map(|&idx| &mut self.series[idx])
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.index.contains_key(symbol)
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        self.series.iter().map(|s| s.symbol.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedSeries> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
