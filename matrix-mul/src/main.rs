use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use matmul_comm::TcpTransport;
use matrix_mul::matrix_file::{random_matrix, read_matrix, write_matrix};
use matrix_mul::{AtStep, Config, Error, Outcome, Step, Stopwatch, plan, run_local, run_participant};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let config = Config::from_env()?;
    let mode = args.get(1).cloned().unwrap_or_default();

    let outcome = match mode.as_str() {
        "generate" => generate(&args).await,
        "local" => local(&args, &config).await,
        "node" => node(&args, &config).await,
        _ => {
            usage(args.first().map_or("matrix-mul", String::as_str));
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
    Ok(())
}

async fn generate(args: &[String]) -> Result<(), Error> {
    let path = arg::<String>(args, 2, "file")?;
    let rows = arg(args, 3, "rows")?;
    let cols = arg(args, 4, "cols")?;

    let matrix = random_matrix(rows, cols, &mut rand::thread_rng());
    write_matrix(&path, &matrix).await?;
    println!("Wrote {}x{} matrix to {}", rows, cols, path);
    Ok(())
}

async fn local(args: &[String], config: &Config) -> Result<(), Error> {
    let a = read_matrix(arg::<String>(args, 2, "a-file")?).await?;
    let b = read_matrix(arg::<String>(args, 3, "b-file")?).await?;
    let participants = arg(args, 4, "participants")?;
    let output = args.get(5);

    let result = {
        let _timer = Stopwatch::start("distributed multiply");
        run_local(a, b, participants, config).await?
    };
    report(&result, output).await
}

async fn node(args: &[String], config: &Config) -> Result<(), Error> {
    let rank: usize = arg(args, 2, "rank")?;
    let peers = arg::<String>(args, 3, "peers")?
        .split(',')
        .map(|addr| {
            addr.trim()
                .parse::<SocketAddr>()
                .map_err(|_| Error::Usage(format!("invalid peer address {:?}", addr)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let inputs = if rank == 0 {
        let a = read_matrix(arg::<String>(args, 4, "a-file")?).await?;
        let b = read_matrix(arg::<String>(args, 5, "b-file")?).await?;
        plan(&a, &b, peers.len(), config)?;
        Some((a, b))
    } else {
        None
    };

    println!("Rank {} joining group of {}...", rank, peers.len());
    let transport = TcpTransport::connect(rank, &peers, &config.connect)
        .await
        .at(Step::Connect)?;

    let outcome = {
        let _timer = Stopwatch::start("distributed multiply");
        let inputs = inputs.as_ref().map(|(a, b)| (a, b));
        run_participant(&transport, inputs, config).await?
    };

    match outcome {
        Outcome::Product(result) => report(&result, args.get(6)).await,
        Outcome::Worked(work) => {
            println!(
                "Rank {} done: {} rows x {} columns",
                work.rank, work.shape.rows, work.shape.columns
            );
            Ok(())
        }
    }
}

async fn report(result: &matmul_types::Matrix, output: Option<&String>) -> Result<(), Error> {
    match output {
        Some(path) => {
            write_matrix(path, result).await?;
            println!("Result ({}x{}) written to {}", result.rows(), result.cols(), path);
        }
        None => {
            println!("Result ({}x{}):", result.rows(), result.cols());
            print!("{}", result);
        }
    }
    Ok(())
}

fn arg<T: FromStr>(args: &[String], index: usize, name: &str) -> Result<T, Error> {
    let value = args
        .get(index)
        .ok_or_else(|| Error::Usage(format!("missing <{}>", name)))?;
    value
        .parse()
        .map_err(|_| Error::Usage(format!("invalid <{}>: {:?}", name, value)))
}

fn usage(program: &str) {
    eprintln!("Usage: {} <mode> [args...]", program);
    eprintln!("Modes:");
    eprintln!("  generate <file> <rows> <cols>                     - Write a random matrix");
    eprintln!("  local <a-file> <b-file> <participants> [out]      - Run every rank in-process");
    eprintln!("  node <rank> <addr0,addr1,...> [<a> <b> [out]]     - Run one rank over TCP");
    eprintln!("Environment:");
    eprintln!(
        "  {}  minimum rows per participant (default {})",
        matrix_mul::MIN_ROWS_ENV,
        matrix_mul::DEFAULT_MIN_ROWS_PER_PARTICIPANT
    );
}
