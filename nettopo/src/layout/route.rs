//! Layout phase B: deterministic Manhattan wire routing.
//!
//! Each net gets a horizontal routing channel below all component bounding
//! boxes; each pin drops a vertical stub to the channel. When the straight
//! drop would collide with another net's claimed run or pin column, the pin
//! escapes with a dogleg: a short drop at the pin column, a jog along the
//! first clear row, and a drop to the channel from the cleared column.
//! Consecutive stubs are joined along the channel. Every emitted segment is
//! claimed (channel Ys, vertical runs keyed by X, horizontal runs keyed by
//! Y); claims are scoped to one router instance and never released, which
//! makes the no-overlap guarantee structural.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::geometry::{Point, GRID};
use crate::schema::{Junction, Wire};

/// Widest dogleg jog the router will try before moving to the next row.
const MAX_ESCAPE_COLS: i64 = 64;

/// One net's pins, in routing order.
#[derive(Debug, Clone)]
pub struct NetPins {
    pub name: String,
    pub pins: Vec<Point>,
}

/// Routed geometry for one net.
#[derive(Debug, Clone)]
pub struct RoutedNet {
    pub name: String,
    pub wires: Vec<Wire>,
}

/// Routed geometry for a whole layout invocation.
#[derive(Debug, Clone, Default)]
pub struct RouteResult {
    pub nets: Vec<RoutedNet>,
    pub junctions: Vec<Junction>,
}

impl RouteResult {
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.nets.iter().flat_map(|n| n.wires.iter())
    }
}

/// Claimed coordinate span along one grid line (a column or a row).
#[derive(Debug, Clone, Copy)]
struct Run {
    a0: i64,
    a1: i64,
    net: usize,
}

/// Channel router. State lives for exactly one layout invocation.
pub struct ChannelRouter {
    /// First candidate channel Y, below every component bounding box.
    channel_start: i64,
    /// Channel Y → owning net index.
    channels: HashMap<i64, usize>,
    /// X column → claimed vertical runs.
    verticals: HashMap<i64, Vec<Run>>,
    /// Y row → claimed horizontal runs (jogs and channel spans).
    horizontals: HashMap<i64, Vec<Run>>,
    /// Every pin position with its owning net, for collision checks.
    pins: Vec<(i64, i64, usize)>,
}

impl ChannelRouter {
    /// `bottom` is the lowest edge of any component bounding box; channels
    /// are allocated strictly below it.
    pub fn new(bottom: f64) -> Self {
        let start = ((bottom / GRID).ceil() as i64 + 1) * GRID as i64;
        Self {
            channel_start: start,
            channels: HashMap::new(),
            verticals: HashMap::new(),
            horizontals: HashMap::new(),
            pins: Vec::new(),
        }
    }

    /// Route every net. Nets are processed in input order; claims made for
    /// earlier nets constrain later ones, never the reverse.
    pub fn route(mut self, nets: &[NetPins]) -> RouteResult {
        for (i, net) in nets.iter().enumerate() {
            for pin in &net.pins {
                let k = pin.key();
                self.pins.push((k.0, k.1, i));
            }
        }

        let mut result = RouteResult::default();
        for (i, net) in nets.iter().enumerate() {
            let wires = self.route_net(i, net);
            result.nets.push(RoutedNet {
                name: net.name.clone(),
                wires,
            });
        }

        let all: Vec<Wire> = result.wires().copied().collect();
        result.junctions = find_junctions(&all);
        debug!(
            nets = nets.len(),
            wires = all.len(),
            junctions = result.junctions.len(),
            "routing complete"
        );
        result
    }

    fn route_net(&mut self, net: usize, pins: &NetPins) -> Vec<Wire> {
        // Deduplicate pins that landed on the same grid point.
        let mut points: Vec<Point> = Vec::new();
        for p in &pins.pins {
            let snapped = p.snapped();
            if !points.iter().any(|q| q.key() == snapped.key()) {
                points.push(snapped);
            }
        }
        if points.len() < 2 {
            return Vec::new();
        }

        let channel_y = self.claim_channel(net);
        trace!(net = %pins.name, channel_y, "channel assigned");

        let mut wires = Vec::new();
        let mut landings: Vec<i64> = Vec::new();
        for p in &points {
            let landing = self.attach_pin(p, channel_y, net, &mut wires);
            if !landings.contains(&landing) {
                landings.push(landing);
            }
        }

        landings.sort_unstable();
        for pair in landings.windows(2) {
            wires.push(Wire::new(
                pair[0] as f64,
                channel_y as f64,
                pair[1] as f64,
                channel_y as f64,
            ));
        }
        if let (Some(&first), Some(&last)) = (landings.first(), landings.last()) {
            if first != last {
                self.claim_horizontal(channel_y, first, last, net);
            }
        }
        wires
    }

    /// Connect one pin down to the channel, preferring the straight drop
    /// and falling back to a dogleg escape. Returns the landing column.
    fn attach_pin(&mut self, p: &Point, channel_y: i64, net: usize, wires: &mut Vec<Wire>) -> i64 {
        let (px, py) = p.key();

        if self.column_clear(px, py, channel_y, net) {
            if py != channel_y {
                wires.push(Wire::new(p.x, p.y, p.x, channel_y as f64));
            }
            self.claim_vertical(px, py, channel_y, net);
            return px;
        }

        let step = GRID as i64;
        let mut jog_row = py + step;
        while jog_row < channel_y {
            // Never jog along another net's channel.
            if self.channels.get(&jog_row).map(|&n| n != net).unwrap_or(false) {
                jog_row += step;
                continue;
            }
            if self.column_clear(px, py, jog_row, net) {
                let mut jog_x = px + step;
                while jog_x <= px + MAX_ESCAPE_COLS * step {
                    if self.row_clear(jog_row, px, jog_x, net)
                        && self.column_clear(jog_x, jog_row, channel_y, net)
                    {
                        wires.push(Wire::new(p.x, p.y, p.x, jog_row as f64));
                        wires.push(Wire::new(
                            p.x,
                            jog_row as f64,
                            jog_x as f64,
                            jog_row as f64,
                        ));
                        wires.push(Wire::new(
                            jog_x as f64,
                            jog_row as f64,
                            jog_x as f64,
                            channel_y as f64,
                        ));
                        self.claim_vertical(px, py, jog_row, net);
                        self.claim_horizontal(jog_row, px, jog_x, net);
                        self.claim_vertical(jog_x, jog_row, channel_y, net);
                        return jog_x;
                    }
                    jog_x += step;
                }
            }
            jog_row += step;
        }

        // No clear escape; route the straight drop anyway so the net stays
        // connected, at the cost of the overlap guarantee for this pin.
        warn!(x = px, y = py, "no clear escape for pin, routing straight");
        if py != channel_y {
            wires.push(Wire::new(p.x, p.y, p.x, channel_y as f64));
        }
        self.claim_vertical(px, py, channel_y, net);
        px
    }

    /// Claim the first channel Y at or below the start line that is neither
    /// a claimed channel nor a row carrying another net's horizontal runs.
    fn claim_channel(&mut self, net: usize) -> i64 {
        let mut y = self.channel_start;
        loop {
            let taken = self.channels.contains_key(&y)
                || self
                    .horizontals
                    .get(&y)
                    .map(|runs| runs.iter().any(|r| r.net != net))
                    .unwrap_or(false);
            if !taken {
                break;
            }
            y += GRID as i64;
        }
        self.channels.insert(y, net);
        y
    }

    /// A vertical run [y0, y1] at column `x` is clear when no other net has
    /// a touching or overlapping run there and no other net's pin sits
    /// strictly inside the span.
    fn column_clear(&self, x: i64, y0: i64, y1: i64, net: usize) -> bool {
        let (a0, a1) = (y0.min(y1), y0.max(y1));
        span_clear(self.verticals.get(&x), a0, a1, net)
            && !self
                .pins
                .iter()
                .any(|&(qx, qy, qnet)| qnet != net && qx == x && qy > a0 && qy < a1)
    }

    /// A horizontal run [x0, x1] at row `y` is clear when no other net has
    /// a touching or overlapping run there and no other net's pin lies on
    /// the span, endpoints included.
    fn row_clear(&self, y: i64, x0: i64, x1: i64, net: usize) -> bool {
        let (a0, a1) = (x0.min(x1), x0.max(x1));
        span_clear(self.horizontals.get(&y), a0, a1, net)
            && !self
                .pins
                .iter()
                .any(|&(qx, qy, qnet)| qnet != net && qy == y && qx >= a0 && qx <= a1)
    }

    fn claim_vertical(&mut self, x: i64, y0: i64, y1: i64, net: usize) {
        self.verticals.entry(x).or_default().push(Run {
            a0: y0.min(y1),
            a1: y0.max(y1),
            net,
        });
    }

    fn claim_horizontal(&mut self, y: i64, x0: i64, x1: i64, net: usize) {
        self.horizontals.entry(y).or_default().push(Run {
            a0: x0.min(x1),
            a1: x0.max(x1),
            net,
        });
    }
}

/// True when no other-net run in `runs` touches or overlaps [a0, a1].
fn span_clear(runs: Option<&Vec<Run>>, a0: i64, a1: i64, net: usize) -> bool {
    runs.map(|rs| {
        rs.iter()
            .all(|r| r.net == net || r.a1 < a0 || a1 < r.a0)
    })
    .unwrap_or(true)
}

/// Emit a junction wherever three or more wire endpoints coincide.
fn find_junctions(wires: &[Wire]) -> Vec<Junction> {
    let mut counts: HashMap<(i64, i64), u32> = HashMap::new();
    for wire in wires {
        let (a, b) = wire.endpoints();
        *counts.entry(a.key()).or_insert(0) += 1;
        *counts.entry(b.key()).or_insert(0) += 1;
    }
    let mut keys: Vec<(i64, i64)> = counts
        .iter()
        .filter(|(_, &c)| c >= 3)
        .map(|(&k, _)| k)
        .collect();
    keys.sort_unstable();
    keys.into_iter()
        .map(|(x, y)| Junction {
            x: x as f64,
            y: y as f64,
        })
        .collect()
}
