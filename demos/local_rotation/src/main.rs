use argh::FromArgs;
use kornia_field::AffineTransform;
use kornia_rotation::{
    ground_truth::{self, GroundTruth},
    local_rotation::{self, JacobianConvention},
};

/// Generate synthetic rotations and recover them from displacement fields
#[derive(Debug, FromArgs)]
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    Generate(GenerateArgs),
    Report(ReportArgs),
    AffineFit(AffineFitArgs),
}

/// Generate a ground truth rotation fixture
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "generate")]
struct GenerateArgs {
    /// random seed
    #[argh(option, short = 's')]
    seed: Option<u64>,

    /// rotation axis as x,y,z (default = random)
    #[argh(option, from_str_fn(parse_vec3))]
    axis: Option<[f64; 3]>,

    /// rotation angle in degrees (default = random)
    #[argh(option)]
    angle: Option<f64>,

    /// print the fixture as json
    #[argh(switch)]
    json: bool,
}

/// Report the local rotation of the fixture field and transform at a point
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "report")]
struct ReportArgs {
    /// physical point as x,y,z
    #[argh(positional, from_str_fn(parse_vec3))]
    point: [f64; 3],

    /// random seed
    #[argh(option, short = 's')]
    seed: Option<u64>,

    /// rotation axis as x,y,z (default = random)
    #[argh(option, from_str_fn(parse_vec3))]
    axis: Option<[f64; 3]>,

    /// rotation angle in degrees (default = random)
    #[argh(option)]
    angle: Option<f64>,

    /// reduce the inverse jacobian instead of the forward one
    #[argh(switch)]
    inverse: bool,
}

/// Estimate the local rotation of the fixture field by a local affine fit
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "affine-fit")]
struct AffineFitArgs {
    /// physical point as x,y,z
    #[argh(positional, from_str_fn(parse_vec3))]
    point: [f64; 3],

    /// neighborhood radius in voxels
    #[argh(option, short = 'r', default = "1")]
    radius: usize,

    /// random seed
    #[argh(option, short = 's')]
    seed: Option<u64>,

    /// rotation axis as x,y,z (default = random)
    #[argh(option, from_str_fn(parse_vec3))]
    axis: Option<[f64; 3]>,

    /// rotation angle in degrees (default = random)
    #[argh(option)]
    angle: Option<f64>,
}

fn parse_vec3(value: &str) -> Result<[f64; 3], String> {
    let parts = value
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid number in '{value}': {e}"))?;
    match parts.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(format!("expected 3 comma separated values, got '{value}'")),
    }
}

fn print_ground_truth(gt: &GroundTruth) {
    println!("Ground truth rotation:");
    println!(
        "  Axis : [{:.6}, {:.6}, {:.6}]",
        gt.axis_angle.axis[0], gt.axis_angle.axis[1], gt.axis_angle.axis[2]
    );
    println!("  Angle: {:.6} degrees", gt.axis_angle.angle_deg);
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    match args.command {
        Command::Generate(args) => {
            let gt = ground_truth::generate_seeded(args.axis, args.angle, args.seed)?;
            if args.json {
                let fixture = serde_json::json!({
                    "axis_angle": gt.axis_angle,
                    "rotation": gt.rotation,
                    "transform": gt.transform,
                    "grid": gt.field.grid(),
                });
                println!("{}", serde_json::to_string_pretty(&fixture)?);
            } else {
                print_ground_truth(&gt);
            }
        }
        Command::Report(args) => {
            let gt = ground_truth::generate_seeded(args.axis, args.angle, args.seed)?;
            print_ground_truth(&gt);

            let convention = if args.inverse {
                JacobianConvention::Inverse
            } else {
                JacobianConvention::Forward
            };
            let affine = AffineTransform::from(&gt.transform);
            log::info!("evaluating local rotation at {:?}", args.point);

            let report = local_rotation::local_rotation_at(
                &args.point,
                Some(&gt.field),
                Some(&affine),
                convention,
            )?;
            print!("{report}");
        }
        Command::AffineFit(args) => {
            let gt = ground_truth::generate_seeded(args.axis, args.angle, args.seed)?;
            print_ground_truth(&gt);

            let estimate = local_rotation::estimate_local_rotation_from_field(
                &gt.field,
                &args.point,
                args.radius,
            )?;
            println!("Local rotation estimated from affine fit:");
            println!("{estimate}");

            let error = estimate.angular_distance_deg(&gt.axis_angle)?;
            println!("  Error vs ground truth: {error:.6} degrees");
        }
    }

    Ok(())
}
