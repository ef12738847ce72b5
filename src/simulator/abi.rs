use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function balanceOf(address account) external view returns (uint256);
    }

    interface IERC721 {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function ownerOf(uint256 tokenId) external view returns (address);
    }

    // Pre-standard NFTs (e.g. CryptoKitties) emit Transfer without indexed arguments
    interface IERC721Legacy {
        event Transfer(address from, address to, uint256 tokenId);
    }

    interface IERC1155 {
        event TransferSingle(address indexed operator, address indexed from, address indexed to, uint256 id, uint256 value);
        event TransferBatch(address indexed operator, address indexed from, address indexed to, uint256[] ids, uint256[] values);

        function balanceOf(address account, uint256 id) external view returns (uint256);
    }

    interface IWrappedNative {
        event Deposit(address indexed dst, uint256 wad);
        event Withdrawal(address indexed src, uint256 wad);
    }
}
