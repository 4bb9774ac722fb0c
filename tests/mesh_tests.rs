mod support;

use nalgebra::{Point3, Vector3};
use support::{approx_eq, cube_at, strip};
use tricell::errors::ValidationError;
use tricell::float_types::Real;
use tricell::mesh::{Triangle, TriangleMesh};

#[test]
fn cube_adjacency() {
    let cube = TriangleMesh::cube(1.0);

    assert_eq!(cube.edge_adjacency().edge_count(), 18);
    for t in 0..cube.num_triangles() {
        let neighbours = cube.face_neighbours(t);
        assert_eq!(neighbours.len(), 3, "triangle {t} of a closed cube has three edge neighbours");
        assert!(!neighbours.contains(&t));
        for n in neighbours {
            assert!(cube.is_neighbours(n, t));
        }
    }
    // Every cube corner is used by 3 to 6 triangles depending on the diagonals.
    for v in 0..cube.num_vertices() {
        let incident = cube.vertex_neighbours(v).len();
        assert!((3..=6).contains(&incident), "vertex {v} has {incident} triangles");
    }
}

#[test]
fn extraneous_vertex_removal_is_idempotent() {
    let mut mesh = cube_at([0.0, 0.0, 0.0], 1.0);
    mesh.push_vertex(Point3::new(5.0, 5.0, 5.0));
    mesh.push_vertex(Point3::new(6.0, 5.0, 5.0));
    assert_eq!(mesh.num_vertices(), 10);

    assert_eq!(mesh.remove_extraneous_vertices(), 2);
    assert_eq!(mesh.num_vertices(), 8);
    assert_eq!(mesh.normals().len(), 8);
    assert!(mesh.validate().is_empty());

    let snapshot = mesh.vertices().to_vec();
    assert_eq!(mesh.remove_extraneous_vertices(), 0);
    assert_eq!(mesh.vertices(), snapshot.as_slice());
}

#[test]
fn extraneous_vertex_removal_compacts_indices() {
    let mut mesh = TriangleMesh::from_parts(
        vec![
            Point3::new(9.0, 9.0, 9.0),
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![Triangle::new(1, 2, 3)],
    );
    mesh.set_colors(vec![Vector3::x(), Vector3::y(), Vector3::z(), Vector3::zeros()]).unwrap();

    assert_eq!(mesh.remove_extraneous_vertices(), 1);
    assert_eq!(mesh.triangle(0), Triangle::new(0, 1, 2));
    assert_eq!(mesh.vertex(0), Point3::origin());
    assert_eq!(mesh.colors(), &[Vector3::y(), Vector3::z(), Vector3::zeros()]);
}

#[test]
fn duplicate_triangle_removal_is_idempotent() {
    let mut mesh = cube_at([0.0, 0.0, 0.0], 1.0);
    let first = mesh.triangle(0);
    let fifth = mesh.triangle(5);
    mesh.push_triangle(first);
    mesh.push_triangle(fifth);
    mesh.push_triangle(first);
    // Same corners, different rotation: a distinct triangle.
    let [a, b, c] = first.indices();
    mesh.push_triangle(Triangle::new(b, c, a));

    assert_eq!(mesh.remove_duplicate_triangles(), 3);
    assert_eq!(mesh.num_triangles(), 13);
    assert_eq!(mesh.triangle(0), first);

    let snapshot = mesh.triangles().to_vec();
    assert_eq!(mesh.remove_duplicate_triangles(), 0);
    assert_eq!(mesh.triangles(), snapshot.as_slice());
}

#[test]
fn cached_areas_and_bounds_track_mutation() {
    let mut mesh = strip(2);
    mesh.update_triangle_areas();
    assert_eq!(mesh.triangle_areas(), &[0.5; 4]);

    let bounds = mesh.bounding_box().unwrap();
    assert_eq!(bounds.maxs, Point3::new(2.0, 1.0, 0.0));

    mesh.translate(Vector3::new(0.0, 0.0, 3.0));
    assert_eq!(mesh.bounding_box().unwrap().mins.z, 3.0);

    mesh.remove_triangles(&[0, 1]);
    assert_eq!(mesh.triangle_areas().len(), 2);
    assert!(approx_eq(mesh.triangle_area(1), 0.5, 1e-12));
}

#[test]
fn open_strip_has_boundary() {
    let analysis = strip(3).analyze_topology();
    assert_eq!(analysis.components, 1);
    assert_eq!(analysis.boundary_edges, 8);
    assert!(!analysis.is_closed);
    assert!(analysis.consistent_orientation);
}

#[test]
fn validation_flags_bad_input() {
    let mesh = TriangleMesh::from_parts(
        vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(Real::NAN, 0.0, 0.0)],
        vec![Triangle::new(0, 1, 7), Triangle::new(0, 0, 1)],
    );
    let issues = mesh.validate();
    assert!(issues.contains(&ValidationError::IndexOutOfRange { triangle: 0, index: 7 }));
    assert!(issues.contains(&ValidationError::DegenerateTriangle { triangle: 1 }));
    assert!(issues.iter().any(|e| matches!(e, ValidationError::InvalidCoordinate(_))));
    let missing = issues
        .iter()
        .find(|e| matches!(e, ValidationError::IndexOutOfRange { .. }))
        .unwrap();
    assert_eq!(missing.to_string(), "(IndexOutOfRange) Triangle 0 references missing vertex 7");
    assert_eq!(
        ValidationError::DegenerateTriangle { triangle: 1 }.to_string(),
        "(DegenerateTriangle) Triangle 1 repeats a vertex index"
    );

    let mut cube = TriangleMesh::cube(1.0);
    assert!(matches!(
        cube.set_colors(vec![Vector3::zeros(); 3]),
        Err(ValidationError::ColorCount { colors: 3, vertices: 8 })
    ));
}

#[test]
fn smoothing_shrinks_a_cube_and_keeps_topology() {
    let mut cube = cube_at([-1.0, -1.0, -1.0], 2.0);
    let before = cube.volume();
    cube.smooth(0.2, 1);
    assert_eq!(cube.num_triangles(), 12);
    assert!(cube.volume() < before);
    for n in cube.normals() {
        assert!(approx_eq(n.norm(), 1.0, 1e-9));
    }
}

#[test]
fn smoothing_selected_vertices_only_moves_those() {
    let mesh = strip(2);
    let mut lifted = mesh.vertices().to_vec();
    lifted[2].z = 1.0;
    let mut bumped = TriangleMesh::from_parts(lifted, mesh.triangles().to_vec());

    bumped.smooth_vertices(1.0, 1, &[2]);
    assert!(bumped.vertex(2).z < 1.0);
    for v in [0, 1, 3, 4, 5] {
        assert_eq!(bumped.vertex(v), mesh.vertex(v));
    }
}
