use criterion::{criterion_group, criterion_main, Criterion};

use linfa::ParamGuard;
use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use pelletq_model::*;
use rand_xoshiro::Xoshiro256Plus;

fn plant_like(n: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let x = Array2::random_using((n, 8), Uniform::new(0., 1.), &mut rng);
    let y = x.map_axis(Axis(1), |row| {
        80. + 5. * row[0] - 3. * row[1] * row[1] + 2. * (6. * row[2]).sin()
    });
    (x, y)
}

fn criterion_benchmark(c: &mut Criterion) {
    let (xt, yt) = plant_like(200);

    let mut group = c.benchmark_group("train");
    group.sample_size(10);
    group.bench_function("random_forest_100", |b| {
        let params = RandomForest::params().n_trees(100).check().unwrap();
        b.iter(|| params.train(&xt, &yt).unwrap())
    });
    group.bench_function("gradient_boosting_100", |b| {
        let params = GradientBoosting::params().n_trees(100).check().unwrap();
        b.iter(|| params.train(&xt, &yt).unwrap())
    });
    group.bench_function("bayesian_ridge_kfold", |b| {
        let params = PipelineParams::new(RegressorParams::BayesianRidge(
            BayesianRidge::params().check().unwrap(),
        ));
        b.iter(|| cross_validate(&params, &xt, &yt, CvStrategy::KFold { k: 5, seed: 42 }).unwrap())
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
