macro_rules! register_scrapers {
    (
        $(
            $module:ident => $scraper_type:ident
        ),* $(,)?
    ) => {
        // Import all scraper modules
        $(
            pub mod $module;
            pub use $module::$scraper_type;
        )*

        // Generate the enum with all scraper types
        #[derive(Clone)]
        pub enum ScraperType {
            $(
                $scraper_type($scraper_type),
            )*
        }

        // Implement Scraper for ScraperType by delegation
        impl Scraper for ScraperType {
            fn name(&self) -> &'static str {
                match self {
                    $(
                        ScraperType::$scraper_type(s) => s.name(),
                    )*
                }
            }

            fn help(&self) -> &'static str {
                match self {
                    $(
                        ScraperType::$scraper_type(s) => s.help(),
                    )*
                }
            }

            fn version(&self) -> f64 {
                match self {
                    $(
                        ScraperType::$scraper_type(s) => s.version(),
                    )*
                }
            }

            fn enabled_by_default(&self) -> bool {
                match self {
                    $(
                        ScraperType::$scraper_type(s) => s.enabled_by_default(),
                    )*
                }
            }

            fn scrape<'a>(
                &'a self,
                instance: &'a Instance,
                sink: &'a MetricSink,
            ) -> BoxFuture<'a, Result<(), ScrapeError>> {
                match self {
                    $(
                        ScraperType::$scraper_type(s) => s.scrape(instance, sink),
                    )*
                }
            }
        }

        /// Every scraper known to the exporter, in registration order.
        ///
        /// Scraper selection (`filter_scrapers`) preserves this order, so
        /// the registry is the single source of scrape ordering.
        #[must_use]
        pub fn all_scrapers() -> Vec<ScraperType> {
            vec![
                $(
                    ScraperType::$scraper_type($scraper_type::new()),
                )*
            ]
        }
    };
}
