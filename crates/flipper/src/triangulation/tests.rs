use super::*;
use proptest::prelude::*;
use std::sync::Arc;

fn s_1_1() -> Arc<Triangulation> {
    Arc::new(Triangulation::new(vec![[0, 2, 1], [0, 2, 1]]))
}
fn s_0_3() -> Arc<Triangulation> {
    Arc::new(Triangulation::new(vec![[0, 1, 2], [0, 2, 1]]))
}
fn s_1_2() -> Arc<Triangulation> {
    Arc::new(Triangulation::new(vec![[0, 2, 1], [0, 4, 3], [2, 5, 4], [1, 3, 5]]))
}
fn doubled_square() -> Arc<Triangulation> {
    Arc::new(Triangulation::new(vec![[0, 1, 2], [0, 2, 3], [4, 5, 1], [4, 3, 5]]))
}
fn doubled_pentagon() -> Arc<Triangulation> {
    Arc::new(Triangulation::new(vec![
        [0, 1, 2],
        [0, 2, 3],
        [4, 5, 1],
        [4, 3, 6],
        [7, 8, 5],
        [7, 6, 8],
    ]))
}

#[test]
fn canonical_form_ignores_rotation_and_order() {
    let t = Triangulation::new(vec![[2, 1, 0], [1, 2, 0]]);
    assert_eq!(t.triangles(), &[[0, 1, 2], [0, 2, 1]]);
    assert_eq!(t, *s_0_3());
}

#[test]
#[should_panic(expected = "exactly twice")]
fn malformed_labels_panic() {
    let _ = Triangulation::new(vec![[0, 1, 2], [0, 1, 1]]);
}

#[test]
fn euler_characteristic_and_vertices() {
    let t = s_1_1();
    assert_eq!(t.zeta(), 3);
    assert_eq!(t.euler_characteristic(), -1);
    assert_eq!(t.max_order(), 7);
    assert_eq!(t.num_vertices(), 1);
    assert_eq!(s_0_3().num_vertices(), 3);
    assert_eq!(s_1_2().num_vertices(), 2);
    assert_eq!(doubled_pentagon().num_vertices(), 5);
    // Every corner lies in exactly one class.
    let t = s_1_2();
    let total: usize = t.vertex_classes().iter().map(Vec::len).sum();
    assert_eq!(total, 3 * t.num_triangles());
}

#[test]
fn tropical_flip_on_the_torus() {
    let t = s_1_1();
    assert_eq!(t.square_about_edge(0), [2, 1, 2, 1]);
    let w = t.flip_effect(0, &[1i64, 0, 1]).unwrap();
    // max(1 + 1, 0 + 0) − 1
    assert_eq!(w, vec![1, 0, 1]);
    let flipped = t.flip_edge(0);
    assert_eq!(flipped.triangles(), &[[0, 1, 2], [0, 1, 2]]);
    assert_eq!(flipped.flip_edge(0), *t);
}

#[test]
fn self_folded_edge_is_not_flippable() {
    // A monogon [0, 1, 1] around a once-punctured disc.
    let t = Triangulation::new(vec![[0, 1, 1], [0, 2, 3], [2, 4, 4], [3, 5, 5]]);
    assert!(!t.is_flippable(1));
    assert!(t.is_flippable(0));
}

#[test]
fn contracting_an_edge_merges_its_ends() {
    let t = doubled_square();
    let (s, labels, vertex_map) = t.contract_edge_tracked(0).unwrap();
    assert_eq!((s.num_triangles(), s.zeta(), s.num_vertices()), (2, 3, 3));
    assert_eq!(labels[0], None);
    assert_eq!(labels[1], labels[3]);
    let [u, v] = t.edge_ends(0);
    assert_eq!(vertex_map[u], vertex_map[v]);
    let mut images = vertex_map.clone();
    images.sort();
    images.dedup();
    assert_eq!(images, vec![0, 1, 2]);
    // Every edge of the torus is a loop.
    assert!(s_1_1().contract_edge_tracked(0).is_none());
}

/// A `2k`-gon with opposite sides glued and a puncture at its centre, coned
/// from the centre. Side `i` is edge `i mod k`, the spoke to corner `i` is
/// edge `k + i`.
fn coned_polygon(n: usize) -> Arc<Triangulation> {
    let k = n / 2;
    Arc::new(Triangulation::new(
        (0..n).map(|i| [i % k, k + (i + 1) % n, k + i]).collect(),
    ))
}

#[test]
fn isometry_group_sizes() {
    for (t, count) in [
        (s_0_3(), 6),
        (s_1_1(), 6),
        (s_1_2(), 3),
        (doubled_square(), 4),
        (doubled_pentagon(), 2),
    ] {
        assert_eq!(t.find_isometries(&t).len(), count, "{:?}", t.triangles());
    }
}

#[test]
fn isometry_group_sizes_of_glued_polygons() {
    // Rotations of the polygon; the gluing of opposite sides commutes with them.
    for n in [12, 24, 36] {
        let t = coned_polygon(n);
        assert_eq!(t.num_vertices(), 2);
        assert_eq!(t.euler_characteristic(), -(n as i64) / 2);
        assert_eq!(t.find_isometries(&t).len(), n);
    }
}

#[test]
fn isometries_compose_and_invert() {
    let t = s_1_2();
    let isos = t.find_isometries(&t);
    for f in &isos {
        let id = f.after(&f.inverse()).unwrap();
        assert_eq!(id.edge_map(), Isometry::identity(t.clone()).edge_map());
        assert_eq!(f.apply(&f.inverse().apply(&[0, 1, 2, 3, 4, 5])), vec![0, 1, 2, 3, 4, 5]);
    }
}

#[test]
fn flipped_triangulations_are_isometric_across_relabelling() {
    let t = s_1_1();
    let other = Arc::new(Triangulation::new(vec![[1, 0, 2], [1, 0, 2]]));
    assert_eq!(t.find_isometries(&other).len(), 6);
    assert!(t.find_isometries(&s_0_3()).is_empty());
}

#[test]
fn isometry_rejects_non_bijection() {
    let t = s_1_2();
    assert!(Isometry::new(t.clone(), t.clone(), vec![(0, 0); 4]).is_err());
}

#[test]
fn filtered_isometries_respect_corners() {
    let t = doubled_square();
    let fixed = |a: Corner, b: Corner| t.vertex_of(a) == t.vertex_of(b);
    let isos = t.find_isometries_filtered(&t, fixed);
    assert_eq!(isos.len(), 1);
    assert_eq!(isos[0].edge_map(), &[0, 1, 2, 3, 4, 5]);
}

#[test]
fn face_and_marking_matrices() {
    let t = s_1_1();
    assert_eq!(t.face_matrix().shape(), (6, 3));
    // One vertex with six corners.
    assert_eq!(t.marking_matrices().len(), 6);
    let t = s_1_2();
    let sizes: usize = t.vertex_classes().iter().map(Vec::len).product();
    assert_eq!(t.marking_matrices().len(), sizes);
    assert!(t.marking_matrices().iter().all(|m| m.nrows() == 2));
}

#[test]
fn key_curves_of_small_surfaces() {
    assert_eq!(
        s_1_1().key_curves(),
        &[vec![0, 1, 1], vec![1, 0, 1], vec![1, 1, 0]]
    );
    // A thrice-punctured sphere carries no essential curve.
    assert!(s_0_3().key_curves().is_empty());
    let t = s_1_2();
    assert_eq!(t.key_curves().len(), 9);
    assert!(t.key_curves().iter().all(|w| t.is_multicurve_weights(w)));
}

#[test]
fn multicurve_predicate() {
    let t = s_1_1();
    assert!(t.is_multicurve_weights(&[1, 1, 0]));
    assert!(t.is_multicurve_weights(&[2, 2, 0]));
    assert!(!t.is_multicurve_weights(&[1, 1, 1]));
    assert!(!t.is_multicurve_weights(&[0, 0, 0]));
    assert!(!t.is_multicurve_weights(&[3, 1, 0]));
}

fn surfaces() -> Vec<Arc<Triangulation>> {
    vec![s_1_1(), s_0_3(), s_1_2(), doubled_square(), doubled_pentagon()]
}

proptest! {
    #[test]
    fn flips_are_involutions(which in 0usize..5, edges in prop::collection::vec(0usize..9, 1..12)) {
        let mut t = (*surfaces()[which]).clone();
        for e in edges {
            let e = e % t.zeta();
            if !t.is_flippable(e) {
                continue;
            }
            let (flipped, vertex_map) = t.flip_edge_tracked(e);
            prop_assert_eq!(&flipped.flip_edge(e), &t);
            let mut sorted = vertex_map.clone();
            sorted.sort();
            prop_assert_eq!(sorted, (0..t.num_vertices()).collect::<Vec<_>>());
            for f in (0..t.zeta()).filter(|&f| f != e) {
                let mut old: Vec<usize> = t.edge_ends(f).iter().map(|&v| vertex_map[v]).collect();
                let mut new = flipped.edge_ends(f).to_vec();
                old.sort();
                new.sort();
                prop_assert_eq!(old, new);
            }
            t = flipped;
        }
    }
}
