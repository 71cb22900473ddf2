//! A small library of surfaces with named generators.
//!
//! Purpose
//! - Give tests, benches and the CLI ready-made mapping class groups: the
//!   once-punctured torus, the twice-punctured torus and doubled polygons
//!   (punctured spheres with the standard half twist generators).
//!
//! Words
//! - A lower-case letter is its generator, the upper-case letter its inverse.
//! - Words compose like products: `"ab"` is `a * b`, so `b` acts first.
//!
//! Randomness
//! - `random_word` is seeded (`StdRng::seed_from_u64`) so benches and tests
//!   replay the same words.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::encoding::Encoding;
use crate::error::{FlipperError, Result};
use crate::lamination::Lamination;
use crate::triangulation::{Edge, Triangle, Triangulation};

/// How a generator acts on its curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Twist {
    Full,
    /// Only for curves bounding a twice-punctured disc.
    Half,
}

#[derive(Clone, Debug)]
struct Generator {
    curve: Vec<i64>,
    kind: Twist,
    encoding: Encoding,
    inverse: Encoding,
}

/// A triangulated surface and its lettered generators.
#[derive(Clone, Debug)]
pub struct Surface {
    name: String,
    triangulation: Arc<Triangulation>,
    generators: BTreeMap<char, Generator>,
}

impl Surface {
    /// Build a surface; each generator is a lower-case letter, a curve given
    /// by its edge weights, and the kind of twist about it.
    pub fn new(
        name: impl Into<String>,
        triangulation: Arc<Triangulation>,
        generators: Vec<(char, Vec<i64>, Twist)>,
    ) -> Result<Self> {
        let mut out = BTreeMap::new();
        for (letter, curve, kind) in generators {
            if !letter.is_ascii_lowercase() || out.contains_key(&letter) {
                return Err(FlipperError::assumption(format!(
                    "generator name {letter:?} is not a fresh lower-case letter"
                )));
            }
            let l = Lamination::new(triangulation.clone(), curve.clone());
            let encoding = match kind {
                Twist::Full => l.encode_twist(1)?,
                Twist::Half => l.encode_halftwist(1)?,
            };
            let inverse = encoding.inverse();
            out.insert(letter, Generator { curve, kind, encoding, inverse });
        }
        let name = name.into();
        tracing::debug!(%name, generators = out.len(), "surface built");
        Ok(Self { name, triangulation, generators: out })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triangulation(&self) -> &Arc<Triangulation> {
        &self.triangulation
    }

    /// Generator letters in alphabetical order.
    pub fn letters(&self) -> impl Iterator<Item = char> + '_ {
        self.generators.keys().copied()
    }

    /// Curve and twist kind behind a lower-case letter.
    pub fn generator(&self, letter: char) -> Option<(&[i64], Twist)> {
        self.generators.get(&letter).map(|g| (g.curve.as_slice(), g.kind))
    }

    /// The product of the letters of `word`, rightmost acting first.
    pub fn mapping_class(&self, word: &str) -> Result<Encoding> {
        let mut f = Encoding::identity(self.triangulation.clone());
        for letter in word.chars().filter(|c| !c.is_whitespace()) {
            let g = self
                .generators
                .get(&letter.to_ascii_lowercase())
                .ok_or_else(|| FlipperError::assumption(format!("unknown generator {letter:?}")))?;
            let step = if letter.is_ascii_uppercase() { &g.inverse } else { &g.encoding };
            f = &f * step;
        }
        Ok(f)
    }

    /// A freely reduced word of `len` letters drawn from `seed`.
    pub fn random_word(&self, len: usize, seed: u64) -> String {
        let alphabet: Vec<char> = self
            .letters()
            .flat_map(|c| [c, c.to_ascii_uppercase()])
            .collect();
        if alphabet.is_empty() {
            return String::new();
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut word = String::with_capacity(len);
        let mut last: Option<char> = None;
        while word.len() < len {
            let c = alphabet[rng.gen_range(0..alphabet.len())];
            if last.is_some_and(|l| cancels(l, c)) {
                continue;
            }
            word.push(c);
            last = Some(c);
        }
        word
    }
}

fn cancels(a: char, b: char) -> bool {
    a != b && a.eq_ignore_ascii_case(&b)
}

/// The thrice-punctured sphere; its mapping class group is finite and it
/// carries no generators here.
pub fn s_0_3() -> Surface {
    Surface {
        name: "S_0_3".into(),
        triangulation: Arc::new(Triangulation::new(vec![[0, 1, 2], [0, 2, 1]])),
        generators: BTreeMap::new(),
    }
}

/// Once-punctured torus with twists `a` and `b` about curves meeting once.
pub fn s_1_1() -> Result<Surface> {
    let t = Arc::new(Triangulation::new(vec![[0, 2, 1], [0, 2, 1]]));
    Surface::new(
        "S_1_1",
        t,
        vec![
            ('a', vec![1, 1, 0], Twist::Full),
            ('b', vec![0, 1, 1], Twist::Full),
        ],
    )
}

/// Twice-punctured torus; `a`, `b`, `c` form a chain (`a` and `c` are
/// disjoint, `b` meets each once).
pub fn s_1_2() -> Result<Surface> {
    let t = Arc::new(Triangulation::new(vec![
        [0, 2, 1],
        [0, 4, 3],
        [2, 5, 4],
        [1, 3, 5],
    ]));
    Surface::new(
        "S_1_2",
        t,
        vec![
            ('a', vec![1, 1, 0, 1, 0, 0], Twist::Full),
            ('b', vec![0, 1, 1, 0, 0, 1], Twist::Full),
            ('c', vec![1, 1, 0, 0, 1, 1], Twist::Full),
        ],
    )
}

/// Two copies of a fan-triangulated `n`-gon glued along the boundary: a
/// sphere with `n` punctures. Boundary edges are shared by both copies,
/// diagonals are not. Also returns the label of each boundary edge
/// `(i, i + 1)`.
fn doubled_triangles(n: usize) -> (Vec<Triangle>, Vec<Edge>) {
    let mut labels: HashMap<(bool, usize, usize), Edge> = HashMap::new();
    let mut label = |copy: bool, a: usize, b: usize| {
        let (lo, hi) = (a.min(b), a.max(b));
        let boundary = hi - lo == 1 || hi - lo == n - 1;
        let key = (copy && !boundary, lo, hi);
        let fresh = labels.len();
        *labels.entry(key).or_insert(fresh)
    };
    let mut triangles = Vec::with_capacity(2 * (n - 2));
    for i in 1..n - 1 {
        triangles.push([label(false, i, i + 1), label(false, i + 1, 0), label(false, 0, i)]);
        triangles.push([label(true, i, i + 1), label(true, 0, i), label(true, i + 1, 0)]);
    }
    let boundary = (0..n - 1).map(|i| label(false, i, i + 1)).collect();
    (triangles, boundary)
}

/// Doubled `n`-gon with half twists `a, b, …` about the curves enclosing the
/// punctures `i` and `i + 1`, for `i` in `0..n − 1`.
pub fn doubled_polygon(n: usize) -> Result<Surface> {
    if n < 3 {
        return Err(FlipperError::assumption("a polygon needs at least three sides"));
    }
    if n == 3 {
        return Ok(s_0_3());
    }
    if n > 27 {
        return Err(FlipperError::assumption("too many punctures to letter"));
    }
    let (triangles, boundary) = doubled_triangles(n);
    let t = Arc::new(Triangulation::new(triangles));
    let generators = boundary
        .iter()
        .zip('a'..='z')
        .map(|(&e, letter)| {
            let curve = t.regular_neighbourhood(e).swap_remove(0);
            (letter, curve, Twist::Half)
        })
        .collect();
    Surface::new(format!("S_0_{n}"), t, generators)
}

/// Look up a bundled surface: `S_0_3`, `S_1_1`, `S_1_2` or `S_0_n` for the
/// doubled `n`-gon.
pub fn by_name(name: &str) -> Result<Surface> {
    match name {
        "S_1_1" => s_1_1(),
        "S_1_2" => s_1_2(),
        other => other
            .strip_prefix("S_0_")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| FlipperError::assumption(format!("unknown surface {other:?}")))
            .and_then(doubled_polygon),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::InvariantCfg;
    use crate::number::{AlgebraicCapability, Number};

    fn same(f: &Encoding, g: &Encoding) -> bool {
        f.eq_on_key_curves(g).unwrap()
    }

    #[test]
    fn doubled_polygons_match_known_triangulations() {
        let (square, boundary) = doubled_triangles(4);
        assert_eq!(square, vec![[0, 1, 2], [0, 2, 3], [4, 5, 1], [4, 3, 5]]);
        assert_eq!(boundary, vec![2, 0, 4]);
        let (pentagon, boundary) = doubled_triangles(5);
        assert_eq!(
            pentagon,
            vec![[0, 1, 2], [0, 2, 3], [4, 5, 1], [4, 3, 6], [7, 8, 5], [7, 6, 8]]
        );
        assert_eq!(boundary, vec![2, 0, 4, 7]);
        assert_eq!(
            Triangulation::new(doubled_triangles(3).0),
            **s_0_3().triangulation()
        );
        assert_eq!(doubled_polygon(3).unwrap().letters().count(), 0);
        assert!(doubled_polygon(2).is_err());
        let pentagon = doubled_polygon(5).unwrap();
        assert_eq!(pentagon.triangulation().num_vertices(), 5);
        assert_eq!(pentagon.generator('a').unwrap().0, &[1, 1, 0, 1, 0, 1, 1, 0, 1]);
        assert_eq!(pentagon.generator('b').unwrap().0, &[0, 1, 1, 1, 1, 0, 0, 0, 0]);
        assert_eq!(pentagon.generator('d').unwrap().0, &[0, 0, 0, 0, 1, 1, 1, 0, 1]);
        assert_eq!(pentagon.generator('b').unwrap().1, Twist::Half);
    }

    #[test]
    fn surfaces_by_name() {
        assert_eq!(by_name("S_1_2").unwrap().letters().count(), 3);
        assert_eq!(by_name("S_0_3").unwrap().letters().count(), 0);
        assert_eq!(by_name("S_0_5").unwrap().name(), "S_0_5");
        assert!(by_name("S_2_0").is_err());
        assert!(by_name("S_0_x").is_err());
    }

    #[test]
    fn torus_words() {
        let s = s_1_1().unwrap();
        assert!(s.mapping_class("").unwrap().is_identity().unwrap());
        assert!(s.mapping_class("aA").unwrap().is_identity().unwrap());
        assert_eq!(s.mapping_class("ab").unwrap().order().unwrap(), 3);
        assert_eq!(s.mapping_class("aB").unwrap().order().unwrap(), 0);
        assert!(same(&s.mapping_class("aba").unwrap(), &s.mapping_class("bab").unwrap()));
        assert_eq!(s.mapping_class("b").unwrap().apply(&[1i64, 1, 0]).unwrap(), vec![1, 2, 1]);
        assert!(matches!(s.mapping_class("ax"), Err(FlipperError::Assumption(_))));
    }

    #[test]
    fn twice_punctured_torus_words() {
        let s = s_1_2().unwrap();
        for (word, order) in [("abc", 4), ("abcb", 3), ("abCb", 0), ("bc", 0)] {
            assert_eq!(s.mapping_class(word).unwrap().order().unwrap(), order, "{word}");
        }
        assert!(same(&s.mapping_class("ac").unwrap(), &s.mapping_class("ca").unwrap()));
        assert!(!same(&s.mapping_class("ab").unwrap(), &s.mapping_class("ba").unwrap()));
    }

    #[test]
    fn half_twists_satisfy_the_braid_relations() {
        let s = doubled_polygon(6).unwrap();
        let letters: Vec<char> = s.letters().collect();
        assert_eq!(letters, vec!['a', 'b', 'c', 'd', 'e']);
        for (i, &x) in letters.iter().enumerate() {
            for &y in &letters[i + 1..] {
                let (xy, yx) = (format!("{x}{y}"), format!("{y}{x}"));
                if y as u8 == x as u8 + 1 {
                    let lhs = s.mapping_class(&format!("{xy}{x}")).unwrap();
                    let rhs = s.mapping_class(&format!("{yx}{y}")).unwrap();
                    assert!(same(&lhs, &rhs), "{x}{y}{x}");
                } else {
                    let lhs = s.mapping_class(&xy).unwrap();
                    assert!(same(&lhs, &s.mapping_class(&yx).unwrap()), "{xy}");
                }
            }
        }
    }

    #[test]
    fn four_punctured_sphere_pseudo_anosov() {
        let s = doubled_polygon(4).unwrap();
        let f = s.mapping_class("aB").unwrap();
        assert_eq!(f.order().unwrap(), 0);
        let found = f
            .invariant_lamination(&AlgebraicCapability, InvariantCfg::default())
            .unwrap();
        let golden_square = (3.0 + 5f64.sqrt()) / 2.0;
        assert!((found.dilatation.to_f64() - golden_square).abs() < 1e-9);
    }

    #[test]
    fn random_words_are_seeded_and_reduced() {
        let s = s_1_2().unwrap();
        let w = s.random_word(40, 7);
        assert_eq!(w.chars().count(), 40);
        assert_eq!(w, s.random_word(40, 7));
        assert_ne!(w, s.random_word(40, 8));
        let chars: Vec<char> = w.chars().collect();
        assert!(chars.windows(2).all(|p| !cancels(p[0], p[1])));
        assert!(s.mapping_class(&w).unwrap().is_mapping_class());
        assert_eq!(s_0_3().random_word(5, 1), "");
    }
}
