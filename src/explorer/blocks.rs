use super::{ChainExplorer, validate_page};
use crate::error::ExplorerResult;
use crate::models::BlockPage;
use crate::normalizer::summarize_block;
use crate::rpc::ChainRpc;
use tracing::debug;

/// Highest block number shown on `page`, or `None` once `page` lies past
/// the genesis block.
pub fn page_start(tip: u64, page: u64, page_size: u64) -> Option<u64> {
    let offset = page.checked_sub(1)?.checked_mul(page_size)?;
    tip.checked_sub(offset)
}

impl<R: ChainRpc> ChainExplorer<R> {
    /// Blocks `start, start-1, ..` for the 1-based `page`, newest first.
    ///
    /// Blocks that fail to load are left out rather than failing the page,
    /// so a page may hold fewer than `page_size` entries.
    pub async fn block_page(&self, page: u64, page_size: u64) -> ExplorerResult<BlockPage> {
        validate_page(page, page_size)?;

        let tip = self.tip().await?;
        let mut result = BlockPage {
            blocks: Vec::new(),
            page,
            page_size,
            total_blocks: tip.saturating_add(1),
            dropped: 0,
        };

        let Some(start) = page_start(tip, page, page_size) else {
            debug!("Page {} is past the last block page (tip {})", page, tip);
            return Ok(result);
        };
        let count = page_size.min(start + 1);

        debug!(
            "Fetching blocks {} down to {} (tip {})",
            start,
            start + 1 - count,
            tip
        );
        let (blocks, dropped) = self.fetch_blocks((0..count).map(|i| start - i), false).await;

        result.blocks = blocks.iter().map(summarize_block).collect();
        result.dropped = dropped;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExplorerError;
    use crate::rpc::mock::MockRpc;

    fn numbers(page: &BlockPage) -> Vec<u64> {
        page.blocks.iter().map(|b| b.number).collect()
    }

    #[test]
    fn test_page_start() {
        assert_eq!(page_start(10, 1, 20), Some(10));
        assert_eq!(page_start(10, 2, 20), None);
        assert_eq!(page_start(45, 3, 20), Some(5));
        assert_eq!(page_start(40, 3, 20), Some(0));
        assert_eq!(page_start(10, 0, 20), None);
        assert_eq!(page_start(10, u64::MAX, u64::MAX), None);
    }

    #[tokio::test]
    async fn test_short_chain_fits_on_first_page() {
        let explorer = ChainExplorer::new(MockRpc::chain(10, |_| 0));

        let first = explorer.block_page(1, 20).await.unwrap();
        assert_eq!(numbers(&first), (0..=10).rev().collect::<Vec<_>>());
        assert_eq!(first.total_blocks, 11);
        assert_eq!(first.total_pages(), 1);

        let second = explorer.block_page(2, 20).await.unwrap();
        assert!(second.blocks.is_empty());
        assert_eq!(second.total_blocks, 11);
    }

    #[tokio::test]
    async fn test_consecutive_pages_are_contiguous() {
        let explorer = ChainExplorer::new(MockRpc::chain(47, |_| 0));

        let mut seen = Vec::new();
        for page in 1..=5 {
            let result = explorer.block_page(page, 10).await.unwrap();
            assert!(result.blocks.len() <= 10);
            let page_numbers = numbers(&result);
            assert!(page_numbers.windows(2).all(|w| w[0] == w[1] + 1));
            if page == 1 {
                assert_eq!(page_numbers[0], 47);
            }
            seen.extend(page_numbers);
        }

        assert_eq!(seen, (0..=47).rev().collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_missing_and_failing_blocks_are_dropped() {
        let mock = MockRpc::chain(9, |_| 0).without_block(7).failing_block(4);
        let explorer = ChainExplorer::new(mock);

        let page = explorer.block_page(1, 10).await.unwrap();
        assert_eq!(numbers(&page), vec![9, 8, 6, 5, 3, 2, 1, 0]);
        assert_eq!(page.dropped, 2);
    }

    #[tokio::test]
    async fn test_invalid_page_arguments() {
        let explorer = ChainExplorer::new(MockRpc::chain(3, |_| 0));

        assert!(explorer.block_page(0, 20).await.unwrap_err().is_validation());
        assert!(explorer.block_page(1, 0).await.unwrap_err().is_validation());
        assert_eq!(explorer.rpc().calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_node_fails_the_page() {
        let explorer = ChainExplorer::new(MockRpc::chain(3, |_| 0).offline());
        let err = explorer.block_page(1, 20).await.unwrap_err();
        assert!(matches!(err, ExplorerError::Lookup(_)));
    }
}
