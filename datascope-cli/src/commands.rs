use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use datascope::{
    CapitalChangeType, DateRange, DividendsType, DssError, EarningsType, EquityOfferingsType,
    ExtractEndpoint, ExtractionResult, IdentifierType, InstrumentList, MergersAcquisitionsType,
    RawRequest, Session, Table, write_files,
};
use datascope_mock::MockConnector;

use crate::args::{Cli, Command, CoraxArgs, CoraxEvent, ExtractArgs, InstrumentArgs, RangeArgs};

const MOCK_CREDENTIAL: &str = "mock";

pub async fn run(cli: Cli) -> Result<(), DssError> {
    match &cli.command {
        Command::IdentifierTypes => {
            let mut out = std::io::stdout().lock();
            for t in IdentifierType::all_known() {
                writeln!(out, "{t}")?;
            }
            Ok(())
        }
        Command::Fields { template } => {
            let session = connect(&cli).await?;
            let mut out = std::io::stdout().lock();
            for f in session.valid_fields(*template).await? {
                writeln!(out, "{}", f.name)?;
            }
            Ok(())
        }
        Command::Preferences => {
            let session = connect(&cli).await?;
            let prefs = session.preferences().await?;
            let text = serde_json::to_string_pretty(&prefs)
                .map_err(|e| DssError::Data(format!("preferences: {e}")))?;
            writeln!(std::io::stdout().lock(), "{text}")?;
            Ok(())
        }
        Command::Rights => {
            let session = connect(&cli).await?;
            print_table(&session.rights().await?)
        }
        Command::BondScheduleTypes => {
            let session = connect(&cli).await?;
            print_table(&session.bond_schedule_types().await?)
        }
        Command::Validate { input, report } => {
            let mut session = connect(&cli).await?;
            let kept = load(&mut session, input, true).await?;
            let mut out = std::io::stdout().lock();
            if let Some(r) = session.validation_report() {
                for line in r.summary_lines() {
                    writeln!(out, "{line}")?;
                }
            }
            writeln!(out, "kept {kept} instruments")?;
            if let Some(path) = report {
                session.write_validation_report(path)?;
            }
            Ok(())
        }
        Command::Price {
            template,
            today_only,
            extract,
        } => {
            let mut session = prepare(&cli, extract).await?;
            session.price(*template, extract.fields.iter().cloned(), *today_only);
            finish(&mut session, extract).await
        }
        Command::PriceHistory { range, extract } => {
            let range = date_range(range)?;
            let mut session = prepare(&cli, extract).await?;
            session.price_history(extract.fields.iter().cloned(), range);
            finish(&mut session, extract).await
        }
        Command::HistoricalPrice { date, extract } => {
            let mut session = prepare(&cli, extract).await?;
            session.single_historical_price(extract.fields.iter().cloned(), *date);
            finish(&mut session, extract).await
        }
        Command::Intraday { extract } => {
            let mut session = prepare(&cli, extract).await?;
            session.price_intraday(extract.fields.iter().cloned());
            finish(&mut session, extract).await
        }
        Command::Composite { extract } => {
            let mut session = prepare(&cli, extract).await?;
            session.composite(extract.fields.iter().cloned());
            finish(&mut session, extract).await
        }
        Command::Reference { template, extract } => {
            let mut session = prepare(&cli, extract).await?;
            session.reference(*template, extract.fields.iter().cloned());
            finish(&mut session, extract).await
        }
        Command::BondSchedule { types, extract } => {
            let mut session = prepare(&cli, extract).await?;
            session.bond_schedule(extract.fields.iter().cloned(), types);
            finish(&mut session, extract).await
        }
        Command::HistoricalReference { range, extract } => {
            let range = date_range(range)?;
            let mut session = prepare(&cli, extract).await?;
            session.historical_reference(extract.fields.iter().cloned(), range);
            finish(&mut session, extract).await
        }
        Command::Holdings {
            allocation_types,
            extract,
        } => {
            let mut session = prepare(&cli, extract).await?;
            session.fund_allocation(extract.fields.iter().cloned(), allocation_types);
            finish(&mut session, extract).await
        }
        Command::Corax(args) => corax(&cli, args).await,
        Command::Raw { request, extract } => {
            let raw = RawRequest::from_path(request)?;
            let mut session = connect(&cli).await?;
            if has_input(&extract.input) {
                load(&mut session, &extract.input, !extract.input.no_validate).await?;
            }
            session.raw_request(raw)?;
            finish(&mut session, extract).await
        }
    }
}

async fn connect(cli: &Cli) -> Result<Session, DssError> {
    let mut builder = Session::builder().poll_interval(Duration::from_secs(cli.poll_interval_secs));
    if let Some(max) = cli.max_polls {
        builder = builder.max_poll_attempts(max);
    }
    if let Some(url) = &cli.base_url {
        builder = builder.base_url(url.clone());
    }

    let (username, password) = if cli.mock {
        tracing::info!("using the fixture connector");
        builder = builder.with_connector(Arc::new(MockConnector::with_polls(0)));
        (
            cli.username.clone().unwrap_or_else(|| MOCK_CREDENTIAL.into()),
            cli.password.clone().unwrap_or_else(|| MOCK_CREDENTIAL.into()),
        )
    } else {
        let username = cli.username.clone().ok_or_else(|| {
            DssError::InvalidArg("missing --username (or DSS_USERNAME)".into())
        })?;
        let password = cli.password.clone().ok_or_else(|| {
            DssError::InvalidArg("missing --password (or DSS_PASSWORD)".into())
        })?;
        (username, password)
    };
    builder.credentials(username, password).build().await
}

fn has_input(input: &InstrumentArgs) -> bool {
    input.instruments.is_some() || input.identifier.is_some()
}

async fn load(session: &mut Session, input: &InstrumentArgs, validate: bool) -> Result<usize, DssError> {
    if let Some(path) = &input.instruments {
        return session.load_csv(path, validate).await;
    }
    if let Some(id) = &input.identifier {
        let list = InstrumentList::single(
            id.clone(),
            IdentifierType::normalize(&input.identifier_type),
            input.source.as_deref(),
        );
        return session.load_instruments(list, validate).await;
    }
    Err(DssError::InvalidArg(
        "no instruments; pass --instruments <csv> or --identifier <id>".into(),
    ))
}

async fn prepare(cli: &Cli, extract: &ExtractArgs) -> Result<Session, DssError> {
    let mut session = connect(cli).await?;
    let kept = load(&mut session, &extract.input, !extract.input.no_validate).await?;
    tracing::info!(instruments = kept, "instruments loaded");
    if extract.plain {
        session.set_endpoint(ExtractEndpoint::Plain);
    }
    Ok(session)
}

fn date_range(range: &RangeArgs) -> Result<DateRange, DssError> {
    DateRange::new(range.start, range.end)
}

fn corax_range(args: &CoraxArgs) -> Result<DateRange, DssError> {
    match (args.start, args.end) {
        (Some(start), Some(end)) => DateRange::new(start, end),
        _ => Err(DssError::InvalidArg(
            "corporate actions need --start and --end".into(),
        )),
    }
}

async fn corax(cli: &Cli, args: &CoraxArgs) -> Result<(), DssError> {
    let fields = args.extract.fields.iter().cloned();
    let date_type = |default: &str| args.date_type.clone().unwrap_or_else(|| default.to_string());

    let mut session = if args.event == CoraxEvent::Delta {
        let mut session = connect(cli).await?;
        if args.extract.plain {
            session.set_endpoint(ExtractEndpoint::Plain);
        }
        session
    } else {
        corax_range(args)?;
        prepare(cli, &args.extract).await?
    };
    match args.event {
        CoraxEvent::Delta => {
            let preferred = IdentifierType::normalize(&args.preferred_type);
            session.corax_delta(fields, &args.filter, preferred);
        }
        CoraxEvent::CapitalChange => {
            let kind: CapitalChangeType = date_type("ann").parse()?;
            session.corax_capital_change(fields, corax_range(args)?, kind);
        }
        CoraxEvent::Dividends => {
            let kind: DividendsType = date_type("ann").parse()?;
            session.corax_dividend(fields, corax_range(args)?, kind);
        }
        CoraxEvent::Earnings => {
            let kind: EarningsType = date_type("ead").parse()?;
            session.corax_earnings(fields, corax_range(args)?, kind);
        }
        CoraxEvent::MergersAcquisitions => {
            let kind: MergersAcquisitionsType = date_type("ann").parse()?;
            session.corax_mergers_acquisitions(fields, corax_range(args)?, kind);
        }
        CoraxEvent::NominalValue => {
            session.corax_nominal_value(fields, corax_range(args)?);
        }
        CoraxEvent::EquityOfferings => {
            let kind: EquityOfferingsType = date_type("all").parse()?;
            session.corax_equity_offerings(fields, corax_range(args)?, kind);
        }
        CoraxEvent::SharesOutstanding => {
            session.corax_shares_outstanding(fields, corax_range(args)?, args.share_types.clone());
        }
        CoraxEvent::VotingRights => {
            session.corax_voting_rights(fields, corax_range(args)?);
        }
    }
    finish(&mut session, &args.extract).await
}

async fn finish(session: &mut Session, extract: &ExtractArgs) -> Result<(), DssError> {
    let result = session.extract().await?;
    for msg in result.exception_messages() {
        tracing::warn!(%msg, "instrument exception");
    }
    match &extract.out {
        Some(path) => write_files(
            &result,
            path,
            extract.notes.as_deref(),
            extract.ric_maintenance.as_deref(),
        ),
        None => {
            print_table(&result.contents)?;
            write_text(&result, extract)
        }
    }
}

/// Notes and RIC maintenance when contents went to standard output.
fn write_text(result: &ExtractionResult, extract: &ExtractArgs) -> Result<(), DssError> {
    let parts: [(Option<&str>, Option<&Path>); 2] = [
        (result.notes(), extract.notes.as_deref()),
        (result.ric_maintenance(), extract.ric_maintenance.as_deref()),
    ];
    for (text, path) in parts {
        if let (Some(text), Some(path)) = (text, path) {
            std::fs::write(path, text)
                .map_err(|e| DssError::Io(format!("{}: {e}", path.display())))?;
        }
    }
    Ok(())
}

fn print_table(table: &Table) -> Result<(), DssError> {
    table.write_csv(std::io::stdout().lock())
}
