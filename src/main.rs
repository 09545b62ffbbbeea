use std::process::ExitCode;
use std::time::Instant;

use clap::{value_parser, Arg, ArgAction, Command};
use env_logger::{Builder, Target};
use log::{debug, error, info, LevelFilter};

use mri_operators::defaults::{
    DEFAULT_CENTER_LINES, DEFAULT_IMAGE_SIZE, DEFAULT_MASK_SEED, DEFAULT_NB_SCALE,
    DEFAULT_SAMPLING_FRACTION, DEFAULT_UNDECIMATED_ID, DEFAULT_WAVELET_NAME,
};
use mri_operators::gradient::zeros_like_domain;
use mri_operators::image::ellipse_phantom;
use mri_operators::ndarray_complex::l2_norm;
use mri_operators::types::Float;
use mri_operators::{
    CartesianFft, FourierOperator, Gradient, LinearOperator, PowerIterationConfig, Result,
    TransformRegistry, Wavelet2, WaveletUD,
};

struct Settings {
    wavelet_name: String,
    nb_scale: usize,
    size: usize,
    fraction: Float,
    undecimated_id: u32,
}

fn report(gradient: &Gradient) -> Result<()> {
    let start = Instant::now();
    let cost = gradient.cost(zeros_like_domain(gradient).view())?;
    debug!("Time elapsed in {} cost is: {:?}", gradient.kind_name(), start.elapsed());
    info!(
        "{} gradient: domain {:?}, Lipschitz constant {:.6}, step size {:.6}, cost at zero {:.6e}",
        gradient.kind_name(),
        gradient.domain_shape(),
        gradient.spec_rad(),
        gradient.inv_spec_rad(),
        cost
    );
    Ok(())
}

fn run(settings: &Settings) -> Result<()> {
    let shape = (settings.size, settings.size);
    let registry = TransformRegistry::with_defaults();
    let config = PowerIterationConfig::default();

    // acquisition
    let start = Instant::now();
    let phantom = ellipse_phantom(shape);
    let fourier = CartesianFft::random_lines(
        shape,
        settings.fraction,
        DEFAULT_CENTER_LINES,
        DEFAULT_MASK_SEED,
    )?;
    let kspace = fourier.op(phantom.view())?;
    let zero_filled = fourier.adj_op(kspace.view())?;
    let relative_error = l2_norm(&(&zero_filled - &phantom)) / l2_norm(&phantom);
    debug!("Time elapsed in acquisition is: {:?}", start.elapsed());
    info!("Sampling ratio: {:.3}", fourier.sampling_ratio());
    info!("Zero-filled relative error: {:.4}", relative_error);

    // linear operators
    let start = Instant::now();
    let wavelet = Wavelet2::new(&registry, &settings.wavelet_name, settings.nb_scale)?;
    let undecimated = WaveletUD::new(settings.undecimated_id, settings.nb_scale, None);
    info!(
        "{} ({} scales) l2norm: {:.6}",
        wavelet.transform_name(),
        wavelet.nb_scale(),
        wavelet.l2norm(shape)?
    );
    info!(
        "Undecimated transform {} l2norm: {:.6}",
        settings.undecimated_id,
        undecimated.l2norm(shape)?
    );
    debug!("Time elapsed in operator norms is: {:?}", start.elapsed());

    // gradients
    let start = Instant::now();
    let analysis = Gradient::analysis(kspace.clone().into_dyn(), &fourier, &config)?;
    debug!("Time elapsed in analysis setup is: {:?}", start.elapsed());
    report(&analysis)?;

    let start = Instant::now();
    let synthesis = Gradient::synthesis(kspace.into_dyn(), &wavelet, &fourier, &config)?;
    debug!("Time elapsed in synthesis setup is: {:?}", start.elapsed());
    report(&synthesis)?;

    let start = Instant::now();
    let (dual_data, _) = undecimated.op(zero_filled.view())?;
    let prox_dual = Gradient::prox_dual(dual_data, &undecimated, shape, &config)?;
    debug!("Time elapsed in prox-dual setup is: {:?}", start.elapsed());
    report(&prox_dual)?;

    Ok(())
}

fn main() -> ExitCode {
    // read CLI arguments
    let matches = Command::new("MRI operators")
        .version("0.1")
        .about("Builds MRI reconstruction operators on a synthetic phantom and reports their norms")
        .arg(
            Arg::new("wavelet")
                .value_name("name")
                .short('w')
                .long("wavelet")
                .help(format!(
                    "Sets the decimated wavelet transform [default: {}]",
                    DEFAULT_WAVELET_NAME
                ))
                .required(false),
        )
        .arg(
            Arg::new("nb_scale")
                .value_name("nb_scale")
                .short('n')
                .long("nb-scale")
                .help(format!(
                    "Sets the number of wavelet scales [default: {}]",
                    DEFAULT_NB_SCALE
                ))
                .required(false)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("size")
                .value_name("size")
                .short('s')
                .long("size")
                .help(format!(
                    "Sets the side length of the square phantom [default: {}]",
                    DEFAULT_IMAGE_SIZE
                ))
                .required(false)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("fraction")
                .value_name("fraction")
                .short('f')
                .long("fraction")
                .help(format!(
                    "Sets the fraction of sampled k-space lines [default: {:.2}]",
                    DEFAULT_SAMPLING_FRACTION
                ))
                .required(false)
                .value_parser(value_parser!(Float)),
        )
        .arg(
            Arg::new("undecimated_id")
                .value_name("id")
                .short('u')
                .long("undecimated-id")
                .help(format!(
                    "Sets the undecimated filter bank id [default: {}]",
                    DEFAULT_UNDECIMATED_ID
                ))
                .required(false)
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Use debug mode"),
        )
        .get_matches();

    let settings = Settings {
        wavelet_name: matches
            .get_one::<String>("wavelet")
            .cloned()
            .unwrap_or_else(|| DEFAULT_WAVELET_NAME.to_owned()),
        nb_scale: *matches.get_one::<usize>("nb_scale").unwrap_or(&DEFAULT_NB_SCALE),
        size: *matches.get_one::<usize>("size").unwrap_or(&DEFAULT_IMAGE_SIZE),
        fraction: *matches
            .get_one::<Float>("fraction")
            .unwrap_or(&DEFAULT_SAMPLING_FRACTION),
        undecimated_id: *matches
            .get_one::<u32>("undecimated_id")
            .unwrap_or(&DEFAULT_UNDECIMATED_ID),
    };
    let debug: bool = matches.get_flag("debug");

    // initialise logger
    let mut builder = Builder::new();
    if debug {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Info);
    }
    builder.target(Target::Stdout);
    builder.init();

    info!("Wavelet transform: {}", settings.wavelet_name);
    info!("Number of scales: {}", settings.nb_scale);
    info!("Phantom size: {0}x{0}", settings.size);
    info!("Sampling fraction: {:.2}", settings.fraction);
    info!("Undecimated filter bank id: {}", settings.undecimated_id);

    let start = Instant::now();
    match run(&settings) {
        Ok(()) => {
            debug!("Total time elapsed is: {:?}", start.elapsed());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
