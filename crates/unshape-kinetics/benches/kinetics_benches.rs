//! Benchmarks for the collision pipeline.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use unshape_kinetics::{
    BoundingSphere, Gravity, Particle, Physics, PhysicsCollider, PhysicsWorld, SimpleMesh,
    Transform, Vec3, simple_mesh_vs_simple_mesh,
};

fn grid_world(count: usize, spacing: f32, meshes: bool) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(Physics::default()).unwrap();
    let gravity = world.add_generator(Gravity::default());
    let cube = SimpleMesh::cuboid(Vec3::splat(0.5));

    for i in 0..count {
        let pos = Vec3::new((i % 10) as f32 * spacing, (i / 10) as f32 * spacing + 5.0, 0.0);
        let body = world.add_body(Particle::new(pos, 1.0));
        world.register_force(body, gravity).unwrap();
        let collider = if meshes {
            PhysicsCollider::from_mesh(body, cube.clone())
        } else {
            PhysicsCollider::sphere(body, BoundingSphere::new(Vec3::ZERO, 0.5))
        };
        world.add_collider(collider).unwrap();
    }
    world
}

fn bench_world_step(c: &mut Criterion) {
    c.bench_function("kinetics_step_100_spheres", |b| {
        let mut world = grid_world(100, 2.0, false);
        b.iter(|| {
            black_box(world.step().unwrap());
        })
    });

    c.bench_function("kinetics_step_100_cubes", |b| {
        let mut world = grid_world(100, 2.0, true);
        b.iter(|| {
            black_box(world.step().unwrap());
        })
    });

    // Packed tightly so every neighbouring pair reaches the narrowphase.
    c.bench_function("kinetics_step_100_cubes_packed", |b| {
        let mut world = grid_world(100, 0.9, true);
        b.iter(|| {
            black_box(world.step().unwrap());
        })
    });
}

fn bench_narrowphase(c: &mut Criterion) {
    let cube = SimpleMesh::cuboid(Vec3::splat(0.5));
    let a = cube.transformed(&Transform::from_position(Vec3::ZERO).matrix());
    let b = cube.transformed(
        &Transform::new(Vec3::new(0.7, 0.2, 0.1), Vec3::new(0.3, 0.6, 0.9), Vec3::ONE).matrix(),
    );

    c.bench_function("sat_cube_vs_cube", |bench| {
        bench.iter(|| black_box(simple_mesh_vs_simple_mesh(black_box(&a), black_box(&b))))
    });

    let mut scratch = SimpleMesh::default();
    let matrix = Transform::new(Vec3::ONE, Vec3::splat(0.4), Vec3::splat(2.0)).matrix();
    c.bench_function("mesh_transform_into", |bench| {
        bench.iter(|| {
            cube.transform_into(black_box(&matrix), &mut scratch);
            black_box(&scratch);
        })
    });
}

criterion_group!(benches, bench_world_step, bench_narrowphase);
criterion_main!(benches);
