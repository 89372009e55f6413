//! Metrics registry and instrument types.
//!
//! Labelled instruments are keyed by label-value vectors in declared label-name
//! order. Every allowed label set is enumerated at registration time and its
//! series is created up front at zero; observations on any other label set are
//! dropped and logged, so series cardinality is fixed for the process lifetime.

use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use marquee_core::error::{MarqueeError, Result};

/// Label values in declared label-name order.
pub type LabelSet = Vec<String>;

/// Helper to escape label values.
fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn escape_help(v: &str) -> String {
    v.replace('\\', "\\\\").replace('\n', "\\n")
}

fn valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    !name.starts_with("__") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Atomically add a float to an `AtomicU64` holding `f64` bits.
fn add_f64(cell: &AtomicU64, v: f64) {
    let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
        Some((f64::from_bits(bits) + v).to_bits())
    });
}

fn load_f64(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Relaxed))
}

/// Declared label names plus the closed set of label values allowed for them.
#[derive(Debug, Clone)]
struct LabelSchema {
    metric: String,
    names: Vec<String>,
    allowed: HashSet<LabelSet>,
}

impl LabelSchema {
    fn new(metric: &str, names: &[&str], allowed: &[LabelSet]) -> Result<Self> {
        for n in names {
            if !valid_label_name(n) {
                return Err(MarqueeError::InvalidMetric(format!(
                    "{metric}: invalid label name {n:?}"
                )));
            }
        }
        let unique: HashSet<&&str> = names.iter().collect();
        if unique.len() != names.len() {
            return Err(MarqueeError::InvalidMetric(format!(
                "{metric}: duplicate label names"
            )));
        }
        if let Some(bad) = allowed.iter().find(|set| set.len() != names.len()) {
            return Err(MarqueeError::InvalidMetric(format!(
                "{metric}: label set {bad:?} does not match label names {names:?}"
            )));
        }
        Ok(Self {
            metric: metric.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            allowed: allowed.iter().cloned().collect(),
        })
    }

    /// Resolve caller-supplied values to a declared label set.
    fn resolve(&self, values: &[&str]) -> Option<LabelSet> {
        if values.len() != self.names.len() {
            return None;
        }
        let key: LabelSet = values.iter().map(|v| v.to_string()).collect();
        self.allowed.contains(&key).then_some(key)
    }

    fn reject(&self, values: &[&str]) {
        tracing::warn!(
            metric = %self.metric,
            labels = ?values,
            "observation on undeclared label set dropped"
        );
    }

    fn render(&self, key: &LabelSet) -> String {
        self.names
            .iter()
            .zip(key)
            .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn sorted(&self) -> Vec<LabelSet> {
        let mut keys: Vec<LabelSet> = self.allowed.iter().cloned().collect();
        keys.sort();
        keys
    }
}

fn braces(label_str: &str) -> String {
    if label_str.is_empty() {
        String::new()
    } else {
        format!("{{{label_str}}}")
    }
}

pub struct CounterVec {
    schema: LabelSchema,
    map: DashMap<LabelSet, AtomicU64>,
}

impl CounterVec {
    fn new(schema: LabelSchema) -> Self {
        let map = DashMap::new();
        for key in &schema.allowed {
            map.insert(key.clone(), AtomicU64::new(0));
        }
        Self { schema, map }
    }

    /// Increment by 1.
    pub fn inc(&self, labels: &[&str]) {
        self.add(labels, 1);
    }

    /// Increment by an arbitrary value.
    pub fn add(&self, labels: &[&str], v: u64) {
        let Some(key) = self.schema.resolve(labels) else {
            self.schema.reject(labels);
            return;
        };
        if let Some(counter) = self.map.get(&key) {
            counter.fetch_add(v, Ordering::Relaxed);
        }
    }

    /// Current value, zero for undeclared label sets.
    pub fn get(&self, labels: &[&str]) -> u64 {
        self.schema
            .resolve(labels)
            .and_then(|key| self.map.get(&key).map(|c| c.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        for key in self.schema.sorted() {
            let Some(c) = self.map.get(&key) else { continue };
            let labels = braces(&self.schema.render(&key));
            let _ = writeln!(out, "{}{} {}", name, labels, c.load(Ordering::Relaxed));
        }
    }
}

/// Unlabelled gauge that never drops below zero.
#[derive(Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    /// Increment by 1.
    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, v: u64) {
        let v = i64::try_from(v).unwrap_or(i64::MAX);
        let _ = self.value.fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
            Some(cur.saturating_add(v))
        });
    }

    /// Decrement by 1. Returns false (and leaves the value alone) at zero.
    pub fn dec(&self) -> bool {
        self.sub(1)
    }

    /// Subtract `v` unless that would take the gauge below zero.
    pub fn sub(&self, v: u64) -> bool {
        let Ok(v) = i64::try_from(v) else { return false };
        self.value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                cur.checked_sub(v).filter(|next| *next >= 0)
            })
            .is_ok()
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "{} {}", name, self.get());
    }
}

struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: Vec<AtomicU64>,
}

impl AtomicHistogram {
    fn new(len: usize) -> Self {
        Self {
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0f64.to_bits()),
            buckets: (0..len).map(|_| AtomicU64::new(0)).collect(),
        }
    }
}

pub struct HistogramVec {
    schema: LabelSchema,
    bounds: Vec<f64>,
    map: DashMap<LabelSet, AtomicHistogram>,
}

impl HistogramVec {
    fn new(schema: LabelSchema, bounds: Vec<f64>) -> Self {
        let map = DashMap::new();
        for key in &schema.allowed {
            map.insert(key.clone(), AtomicHistogram::new(bounds.len()));
        }
        Self { schema, bounds, map }
    }

    /// Observe a value and increment every cumulative bucket it falls under.
    pub fn observe(&self, labels: &[&str], v: f64) {
        let Some(key) = self.schema.resolve(labels) else {
            self.schema.reject(labels);
            return;
        };
        let Some(hist) = self.map.get(&key) else { return };

        for (bucket, &le) in hist.buckets.iter().zip(&self.bounds) {
            if v <= le {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
        add_f64(&hist.sum, v);
        hist.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of observations for a label set.
    pub fn sample_count(&self, labels: &[&str]) -> u64 {
        self.schema
            .resolve(labels)
            .and_then(|key| self.map.get(&key).map(|h| h.count.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    pub fn sample_sum(&self, labels: &[&str]) -> f64 {
        self.schema
            .resolve(labels)
            .and_then(|key| self.map.get(&key).map(|h| load_f64(&h.sum)))
            .unwrap_or(0.0)
    }

    fn render(&self, name: &str, out: &mut String) {
        for key in self.schema.sorted() {
            let Some(hist) = self.map.get(&key) else { continue };
            let label_str = self.schema.render(&key);
            let prefix = if label_str.is_empty() {
                String::new()
            } else {
                format!("{label_str},")
            };

            for (bucket, le) in hist.buckets.iter().zip(&self.bounds) {
                let _ = writeln!(
                    out,
                    "{}_bucket{{{}le=\"{}\"}} {}",
                    name,
                    prefix,
                    le,
                    bucket.load(Ordering::Relaxed)
                );
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);
            let _ = writeln!(out, "{}_sum{} {}", name, braces(&label_str), load_f64(&hist.sum));
            let _ = writeln!(out, "{}_count{} {}", name, braces(&label_str), count);
        }
    }
}

#[derive(Default)]
struct AtomicSummary {
    count: AtomicU64,
    sum: AtomicU64,
}

/// Count and sum of observations, no buckets.
pub struct SummaryVec {
    schema: LabelSchema,
    map: DashMap<LabelSet, AtomicSummary>,
}

impl SummaryVec {
    fn new(schema: LabelSchema) -> Self {
        let map = DashMap::new();
        for key in &schema.allowed {
            map.insert(key.clone(), AtomicSummary::default());
        }
        Self { schema, map }
    }

    pub fn observe(&self, labels: &[&str], v: f64) {
        let Some(key) = self.schema.resolve(labels) else {
            self.schema.reject(labels);
            return;
        };
        if let Some(s) = self.map.get(&key) {
            add_f64(&s.sum, v);
            s.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn sample_count(&self, labels: &[&str]) -> u64 {
        self.schema
            .resolve(labels)
            .and_then(|key| self.map.get(&key).map(|s| s.count.load(Ordering::Relaxed)))
            .unwrap_or(0)
    }

    pub fn sample_sum(&self, labels: &[&str]) -> f64 {
        self.schema
            .resolve(labels)
            .and_then(|key| self.map.get(&key).map(|s| load_f64(&s.sum)))
            .unwrap_or(0.0)
    }

    fn render(&self, name: &str, out: &mut String) {
        for key in self.schema.sorted() {
            let Some(s) = self.map.get(&key) else { continue };
            let labels = braces(&self.schema.render(&key));
            let _ = writeln!(out, "{}_sum{} {}", name, labels, load_f64(&s.sum));
            let _ = writeln!(out, "{}_count{} {}", name, labels, s.count.load(Ordering::Relaxed));
        }
    }
}

enum Instrument {
    Counter(Arc<CounterVec>),
    Gauge(Arc<Gauge>),
    Histogram(Arc<HistogramVec>),
    Summary(Arc<SummaryVec>),
}

impl Instrument {
    fn type_name(&self) -> &'static str {
        match self {
            Instrument::Counter(_) => "counter",
            Instrument::Gauge(_) => "gauge",
            Instrument::Histogram(_) => "histogram",
            Instrument::Summary(_) => "summary",
        }
    }
}

struct Registered {
    name: String,
    help: String,
    instrument: Instrument,
}

/// Owns every instrument and renders them in registration order.
///
/// Registration happens once at startup through `&mut self`; afterwards the
/// registry is shared read-only and instruments are mutated through their
/// own atomics.
#[derive(Default)]
pub struct MetricsRegistry {
    entries: Vec<Registered>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if !valid_metric_name(name) {
            return Err(MarqueeError::InvalidMetric(format!("invalid metric name {name:?}")));
        }
        if self.entries.iter().any(|e| e.name == name) {
            return Err(MarqueeError::InvalidMetric(format!("{name} registered twice")));
        }
        Ok(())
    }

    fn push(&mut self, name: &str, help: &str, instrument: Instrument) {
        self.entries.push(Registered {
            name: name.to_string(),
            help: help.to_string(),
            instrument,
        });
    }

    pub fn counter(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
        label_sets: &[LabelSet],
    ) -> Result<Arc<CounterVec>> {
        self.check_name(name)?;
        let c = Arc::new(CounterVec::new(LabelSchema::new(name, label_names, label_sets)?));
        self.push(name, help, Instrument::Counter(Arc::clone(&c)));
        Ok(c)
    }

    pub fn gauge(&mut self, name: &str, help: &str) -> Result<Arc<Gauge>> {
        self.check_name(name)?;
        let g = Arc::new(Gauge::default());
        self.push(name, help, Instrument::Gauge(Arc::clone(&g)));
        Ok(g)
    }

    pub fn histogram(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
        label_sets: &[LabelSet],
        buckets: &[f64],
    ) -> Result<Arc<HistogramVec>> {
        self.check_name(name)?;
        if label_names.contains(&"le") {
            return Err(MarqueeError::InvalidMetric(format!("{name}: `le` is reserved")));
        }
        if buckets.is_empty()
            || buckets.iter().any(|b| !b.is_finite())
            || buckets.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(MarqueeError::InvalidMetric(format!(
                "{name}: buckets must be finite and strictly increasing"
            )));
        }
        let schema = LabelSchema::new(name, label_names, label_sets)?;
        let h = Arc::new(HistogramVec::new(schema, buckets.to_vec()));
        self.push(name, help, Instrument::Histogram(Arc::clone(&h)));
        Ok(h)
    }

    pub fn summary(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
        label_sets: &[LabelSet],
    ) -> Result<Arc<SummaryVec>> {
        self.check_name(name)?;
        if label_names.contains(&"quantile") {
            return Err(MarqueeError::InvalidMetric(format!("{name}: `quantile` is reserved")));
        }
        let s = Arc::new(SummaryVec::new(LabelSchema::new(name, label_names, label_sets)?));
        self.push(name, help, Instrument::Summary(Arc::clone(&s)));
        Ok(s)
    }

    /// Render all registered instruments in Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for e in &self.entries {
            let _ = writeln!(out, "# HELP {} {}", e.name, escape_help(&e.help));
            let _ = writeln!(out, "# TYPE {} {}", e.name, e.instrument.type_name());
            match &e.instrument {
                Instrument::Counter(c) => c.render(&e.name, &mut out),
                Instrument::Gauge(g) => g.render(&e.name, &mut out),
                Instrument::Histogram(h) => h.render(&e.name, &mut out),
                Instrument::Summary(s) => s.render(&e.name, &mut out),
            }
        }
        out
    }
}
